/*!

The fatal-assert channel. Contract violations (null where non-null is
required, `dec` without a matching `inc`, use-after-`finalize`) are
programmer bugs: the library does not attempt to recover from them because
any continuation would leave the arena or graph's invariants corrupted.

This is the Rust analogue of the original's `FATALF`/`ASSERT` macros in
`debug.c`: report a diagnostic with source location, then terminate. We log
the diagnostic through `tracing` (so it shows up alongside ordinary
`critical!`/`error!` events) and then panic, which aborts the thread/process
rather than returning control to the offending caller.

*/

/// Logs a fatal diagnostic at the call site and aborts.
///
/// ```should_panic
/// use memgraph::abstractions::fatal::fatal;
/// fatal!("dec({:p}, {:p}): no matching inc", 1 as *const (), 2 as *const ());
/// ```
#[macro_export]
macro_rules! fatal {
  ($($arg:tt)+) => {{
    $crate::abstractions::fatal::report(format_args!($($arg)+))
  }};
}

pub use fatal;

/// Backing implementation of the [`fatal!`] macro. Not meant to be called
/// directly; use the macro so that `#[track_caller]` reports the call site
/// rather than this function's location.
#[track_caller]
#[cold]
pub fn report(args: std::fmt::Arguments<'_>) -> ! {
  let location = std::panic::Location::caller();
  crate::abstractions::log::init_logger();
  tracing::event!(tracing::Level::ERROR, critical = true, threshold = 0u8, message = %format_args!("{args} (at {location})"));
  panic!("fatal: {args} (at {location})");
}
