//! Print every decoded terminal event until `q` or Ctrl+C.
//!
//! Puts the terminal in raw mode with bracketed paste and mouse reporting,
//! routes SIGWINCH to the event source, and runs an `EventStream`.
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run --example echo_events
//! ```

use std::time::Duration;

use spark_tui_input::{
    Event, EventSource, EventStream, KeyCode, TerminalSetup, acquire_async_io, runtime,
    write_stdout_async,
};
use tracing_subscriber::EnvFilter;

fn is_exit(event: &Event) -> bool {
    match event {
        Event::Quit => true,
        Event::Key(key) => key.code == KeyCode::Char && key.text == "q" && key.modifiers.is_empty(),
        _ => false,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let _io = acquire_async_io();
    let mut terminal = TerminalSetup::new().with_mouse(true);
    terminal.enter()?;

    let source = EventSource::new();
    let _sigwinch = source.install_resize_handler()?;

    runtime::block_on(async {
        write_stdout_async("press keys, paste, click or resize; q or Ctrl+C quits\r\n").await?;

        let mut stream = EventStream::with_handler(source, |event| {
            // Raw mode: no implicit carriage return.
            print!("{event:?}\r\n");
            !is_exit(&event)
        });
        stream.start_async().await?;
        while stream.is_running() {
            runtime::sleep(Duration::from_millis(50)).await;
        }
        stream.stop_async().await
    })??;

    terminal.exit()?;
    tracing::info!("bye");
    Ok(())
}
