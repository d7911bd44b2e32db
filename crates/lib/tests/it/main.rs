/*! Integration tests for Veneer.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the behavior under test:
 * - updates: Local mutations through DocBinding::update and the patch pipeline
 * - text: Text-backed string fields and character-level edit granularity
 * - sync: Delta exchange between bindings, convergence, and wire errors
 * - validation: Schema enforcement, rollback, and structural violations
 * - lifecycle: Subscriptions, notification order, and disposal
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("veneer=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod sync;
mod updates;
