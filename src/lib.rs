/*!
# Checklist Table

A small web application that renders a CSV file as an interactive HTML table
whose last two columns are checkboxes. Checked state persists across page
reloads through a browser cookie, guarded by a checksum of the column headers
so saved state is discarded when the table changes shape.

## Architecture

The crate is a library plus an optional web front end:

### Core (always built)
- **parser** - CSV text to a row matrix. Minimal quote handling by design:
  commas split fields only outside quotes, quote characters are kept literally,
  and a backslash-escaped quote does not toggle quoting. Never fails.
- **checksum** - Non-cryptographic fingerprint of the header row, used only to
  invalidate stale saved state.
- **store** - `StateStore` trait over a named-blob store with expiry, plus a
  JSON layer and an in-memory implementation for tests and embedders.
- **state** - `StateManager` bridging the rendered table and the store:
  computes the per-column checkbox state, saves it wholesale under one cookie
  key, validates the checksum on load, and resets whole columns.
- **render** - Server-side HTML table construction. Checkbox cells carry
  `data-row`/`data-column` attributes; tracked header cells carry reset
  buttons. Implements the `CheckboxView` interface the state manager works
  against.

### Web layer (feature `web`)
- **app** - axum router: serves the rendered page, accepts checkbox-change and
  column-reset POSTs, and persists state through the request cookie jar
  (cookie `checkboxStates`, path `/`, 30-day expiry). Static assets and the
  CSV file itself are served with `ServeDir`.

## Data flow

CSV text -> parser -> table -> renderer builds checkboxes -> state manager
applies saved cookie state (checksum permitting) -> user toggles a checkbox ->
state manager recomputes and the store rewrites the cookie.

## Usage

Run the `website` binary (requires the `web` feature):

```text
cargo run --features web --bin website -- 127.0.0.1:3000 data/data.csv
```
*/

pub mod checksum;
pub mod parser;
pub mod render;
pub mod state;
pub mod store;

#[cfg(feature = "web")]
pub mod app;

/// Re-export everything from these modules to make it easier to use
pub use checksum::*;
pub use parser::*;
pub use render::*;
pub use state::*;
pub use store::*;
