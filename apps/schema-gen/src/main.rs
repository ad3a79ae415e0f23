use std::{fs, path::PathBuf};

use m1ssion_types::{
    Claim, Marker, Rejection,
    wire::{ErrorEnvelope, RedeemRequest, RedeemSuccess},
};
use schemars::{JsonSchema, schema_for};

fn write_schema<T: JsonSchema>(dir: &PathBuf, name: &str) -> anyhow::Result<()> {
    let schema = schema_for!(T);
    let path = dir.join(format!("{name}.json"));
    fs::write(&path, serde_json::to_string_pretty(&schema)?)?;
    println!("wrote {}", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("schemas"));
    fs::create_dir_all(&dir)?;

    write_schema::<RedeemRequest>(&dir, "redeem-request")?;
    write_schema::<RedeemSuccess>(&dir, "redeem-success")?;
    write_schema::<ErrorEnvelope>(&dir, "error-envelope")?;
    write_schema::<Rejection>(&dir, "rejection")?;
    write_schema::<Marker>(&dir, "marker")?;
    write_schema::<Claim>(&dir, "claim")?;

    Ok(())
}
