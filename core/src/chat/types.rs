#[derive(Clone, Debug)]
pub struct PromptTemplate {
    pub sys_prompt: String,
    // handlebars template over `context_str` and `query_str`
    pub user_prompt: String,
    // stands in for the context when retrieval finds nothing
    pub empty_context: String,
}

#[derive(Debug)]
pub struct RenderedPrompt {
    pub query: String,
    pub context: String,
    pub user_rendered: String,
}
