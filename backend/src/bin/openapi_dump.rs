//! Print the portal OpenAPI document as pretty JSON.

use utoipa::OpenApi;
use wedding_rsvp::doc::ApiDoc;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    println!("{}", ApiDoc::openapi().to_pretty_json()?);
    Ok(())
}
