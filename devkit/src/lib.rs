/*!
# Fleetdeck DevKit - Stubs and Utilities for Development

Support library for working on the console without a live backend:
- Scripted control-API stub for tests and offline development
- Fleet fixture builders
- Test harness wiring the console components to the stub
*/

pub mod fixtures;
pub mod harness;
pub mod stub;

pub use harness::TestHarness;
pub use stub::{AutoConfirm, RecordedCall, StubControlApi};
