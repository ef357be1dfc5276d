//! delta - deployment CLI entry point

fn main() -> anyhow::Result<()> {
    deltacli::run()
}
