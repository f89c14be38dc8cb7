//! Reading tests - load hand-built containers with `XlsxReader`.

mod cells;
mod layout;
mod references;
