//! Terminal output helpers.

use std::io::{self, IsTerminal, Write};

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use treecast_core::converter::CodecInfo;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

pub const CODECS_HINT: &str = "Try the --codecs switch to see all installed codecs";

fn paint(color: &str, msg: &str) -> String {
    if io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none() {
        format!("{}{}{}", color, msg, RESET)
    } else {
        msg.to_string()
    }
}

pub fn red(msg: &str) -> String {
    paint(RED, msg)
}

pub fn green(msg: &str) -> String {
    paint(GREEN, msg)
}

/// Prints without a newline and flushes, for `... OK` style lines.
pub fn print_inline(msg: &str) {
    print!("{}", msg);
    let _ = io::stdout().flush();
}

/// Formats one row of the codec table.
pub fn codec_row(name: &str, installed: &str, filetype: &str) -> String {
    format!("{:>10}{:>10}{:>10}", name, installed, filetype)
}

pub fn print_codec_table(title: &str, header: &str, codecs: &[CodecInfo]) {
    println!("{}:", title);
    println!("{}", codec_row(header, "INSTALLED", "FILETYPE"));
    for codec in codecs {
        let installed = if codec.available { "yes" } else { "no" };
        println!("{}", codec_row(&codec.codec, installed, &codec.format_tag));
    }
}

/// Asks a yes/no question. Anything but `y` is a no, and so is Ctrl+C.
pub async fn confirm(question: &str, assume_yes: bool, cancel: &CancellationToken) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print_inline(&format!("{} [y/n] ", question));

    let read = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        io::stdin().read_line(&mut line).map(|_| line)
    });

    let answer = tokio::select! {
        _ = cancel.cancelled() => {
            println!();
            return Ok(false);
        }
        answer = read => answer??,
    };
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    answer.trim() == "y"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_row_alignment() {
        assert_eq!(
            codec_row("libvorbis", "yes", "ogg"),
            " libvorbis       yes       ogg"
        );
    }

    #[test]
    fn test_only_y_confirms() {
        assert!(is_yes("y\n"));
        assert!(!is_yes("Y\n"));
        assert!(!is_yes("yes\n"));
        assert!(!is_yes(""));
    }

    #[tokio::test]
    async fn test_assume_yes_skips_prompt() {
        assert!(confirm("Continue?", true, &CancellationToken::new())
            .await
            .unwrap());
    }
}
