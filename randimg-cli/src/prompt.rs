// SPDX-License-Identifier: MIT
//
// randimg: Random Noise Images from random.org
// Copyright (c) 2025 randimg Contributors

//! Interactive source selection

use std::io::{self, BufRead, Write};

/// Show the quota and ask whether to spend it
///
/// Repeats until the answer is exactly `y` or `n`. Returns `true` for `y`.
pub fn ask_use_remote<R, W>(quota: i64, mut input: R, mut output: W) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(
            output,
            "Your quota is at {} bits. Do you still want to use www.random.org? [y/n] ",
            quota
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no answer on standard input",
            ));
        }

        match line.trim_end_matches(&['\r', '\n'][..]) {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => writeln!(output, "Not valid. Try again!")?,
        }
    }
}
