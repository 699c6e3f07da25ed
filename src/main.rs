//! Binary entry point. All argument handling lives in the library so the
//! commands can be exercised from tests.

/// Parse the command line and run it. Errors bubble up to `main` so the full
/// context chain is printed and the exit status is non-zero.
fn main() -> anyhow::Result<()> {
    tabsync::run_cli()
}
