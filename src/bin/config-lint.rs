#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(clippy::missing_const_for_fn)]
#![deny(clippy::nursery)]
#![deny(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]

use color_eyre::eyre::{bail, eyre, WrapErr};
use listing_wizard::{category::category_depth, entities::MarketplaceConfig, lint::lint_config};
use tracing::{info, warn};

// Checks a marketplace configuration file (the `/config` JSON) for references
// that don't resolve.
fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    std::env::set_var(
        "RUST_LOG",
        std::env::var("RUST_LOG").unwrap_or_else(|_| String::from("info")),
    );

    // initialize tracing
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| eyre!("usage: config-lint <config.json>"))?;
    let raw = std::fs::read_to_string(&path).wrap_err_with(|| format!("reading {path}"))?;
    let config: MarketplaceConfig =
        serde_json::from_str(&raw).wrap_err_with(|| format!("parsing {path}"))?;

    info!(
        listing_types = config.listing_types.len(),
        listing_fields = config.listing_fields.len(),
        user_fields = config.user_fields.len(),
        category_depth = category_depth(&config.categories.categories),
        "loaded {path}"
    );

    let issues = lint_config(&config);
    for issue in &issues {
        warn!("{issue}");
    }
    if !issues.is_empty() {
        bail!("{} problem(s) found in {path}", issues.len());
    }

    info!("no problems found");
    Ok(())
}
