//! Build the built-in health probe request.
//!
//! Run with:
//!   cargo run --example health-check

use muxcall::request::RequestBuilder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let request = RequestBuilder::health_check("inventory")
        .set_timeout_ms(100)?
        .build()?;

    println!("probe {request}");
    request.release();
    Ok(())
}
