use agora::Agora;
use agora_util_error::WhateverResult;

#[tokio::main]
#[snafu::report]
async fn main() -> WhateverResult<()> {
    Agora::run().await
}
