use rust_embed::Embed;

#[derive(Embed)]
#[folder = "../../frontend/"]
#[exclude = "*.md"]
pub struct FrontendAssets;
