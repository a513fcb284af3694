//! Concurrency type codes, `Sc…` (§4.J "Concurrency types").

use crate::demangle::generics::parse_type;
use crate::demangle::grammar::MangledReader;

fn concurrency_name(code: char) -> Option<&'static str> {
    Some(match code {
        'T' => "Task",
        'C' => "CheckedContinuation",
        'U' => "UnsafeContinuation",
        'A' => "Actor",
        'M' => "MainActor",
        'S' => "AsyncStream",
        'F' => "AsyncThrowingStream",
        'g' => "TaskGroup",
        'G' => "ThrowingTaskGroup",
        'P' => "TaskPriority",
        _ => return None,
    })
}

/// Parses a `Sc<letter>` concurrency type, with `Task`/`CheckedContinuation`/
/// `UnsafeContinuation` optionally parameterised as `Name<y T1 T2 G>` sugar,
/// mirroring the `Say…G` array-sugar shape.
pub fn parse_concurrency_type(r: &mut MangledReader, depth: u32) -> Option<String> {
    let save_pos = r.pos();
    let save_words = r.word_count();
    if !r.eat_str("Sc") {
        r.seek(save_pos);
        return None;
    }
    let Some(letter) = r.advance().map(|b| b as char) else {
        r.seek(save_pos);
        return None;
    };
    let Some(name) = concurrency_name(letter) else {
        r.seek(save_pos);
        return None;
    };

    if matches!(letter, 'T' | 'C' | 'U') && r.eat(b'y') {
        let mut params = Vec::new();
        while let Some(t) = parse_type_for_params(r, depth) {
            params.push(t);
        }
        if r.eat(b'G') && !params.is_empty() {
            return Some(format!("{name}<{}>", params.join(", ")));
        }
        r.seek(save_pos);
        r.truncate_words(save_words);
        return None;
    }

    Some(name.to_string())
}

fn parse_type_for_params(r: &mut MangledReader, depth: u32) -> Option<String> {
    if depth == 0 {
        return None;
    }
    if matches!(r.peek(), Some(b'G') | None) {
        return None;
    }
    // `yt` is the empty-tuple mangling (`()`/`Void`) and `Never` appears bare
    // in generic-parameter position for the bottom type, neither of which
    // fits the digit-prefixed identifier grammar `parse_type` expects.
    if r.eat_str("yt") {
        return Some("Void".to_string());
    }
    if r.eat_str("Never") {
        return Some("Never".to_string());
    }
    parse_type(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_actor() {
        let mut r = MangledReader::new("ScA");
        assert_eq!(parse_concurrency_type(&mut r, 8), Some("Actor".to_string()));
    }

    #[test]
    fn parses_task_with_two_params() {
        let mut r = MangledReader::new("ScTySiSSG");
        assert_eq!(parse_concurrency_type(&mut r, 8), Some("Task<Int, String>".to_string()));
    }

    #[test]
    fn parses_main_actor() {
        let mut r = MangledReader::new("ScM");
        assert_eq!(parse_concurrency_type(&mut r, 8), Some("MainActor".to_string()));
    }

    #[test]
    fn parses_task_with_void_and_never() {
        let mut r = MangledReader::new("ScTyytNeverG");
        assert_eq!(parse_concurrency_type(&mut r, 8), Some("Task<Void, Never>".to_string()));
    }
}
