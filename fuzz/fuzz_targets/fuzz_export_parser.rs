#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use tidyplate::biotek::PlateReaderStreamer;

fuzz_target!(|data: &[u8]| {
    // Any input must either parse or fail with an error, never panic
    let mut streamer = PlateReaderStreamer::new(Cursor::new(data), 10.0);
    if streamer.read_header().is_err() {
        return;
    }

    // Bound the work per input
    for _ in 0..10_000 {
        match streamer.next_row() {
            Ok(Some(_row)) => {}
            Ok(None) | Err(_) => break,
        }
    }
});
