use async_trait::async_trait;

/// Everything an operation needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct OpContext {
    /// Address of the (possibly not yet running) mount daemon.
    pub server_addr: String,
}

#[async_trait]
pub trait Op {
    type Error: std::error::Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}
