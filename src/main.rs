//! templater: render templates against layered YAML values

use anyhow::Result;

fn main() -> Result<()> {
    templater::cli::run()
}
