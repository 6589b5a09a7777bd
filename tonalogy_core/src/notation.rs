// Pitch-class spelling and accidental handling.
//
// Pitch classes are plain `u8` values 0-11 (C = 0). Input accepts ASCII
// (`#`, `b`) and Unicode (`♯`, `♭`) accidentals on a root letter; output
// always uses the sharp spelling from `NOTE_NAMES`, so "Bb" and "A#" name
// the same pitch class and print the same way.
//
// The Unicode helpers only touch the accidental that follows a root letter,
// leaving quality tokens such as "dim" or "m7b5" alone. They work token by
// token, so they can be run over a whole observation or narrative.

/// Canonical sharp spelling of the 12 pitch classes.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub const SHARP_SYMBOL: char = '♯';
pub const FLAT_SYMBOL: char = '♭';

/// Spelled name of a pitch class (taken modulo 12).
pub fn note_name(pc: u8) -> &'static str {
    NOTE_NAMES[(pc % 12) as usize]
}

fn letter_pitch_class(letter: char) -> Option<u8> {
    match letter {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

/// Parse a note name at the start of `text`: an upper-case letter A-G and at
/// most one accidental. Returns the pitch class and the unparsed remainder.
pub fn split_note_prefix(text: &str) -> Option<(u8, &str)> {
    let mut chars = text.char_indices();
    let (_, letter) = chars.next()?;
    let natural = letter_pitch_class(letter)?;
    let after_letter = letter.len_utf8();

    match chars.next() {
        Some((_, c @ ('#' | SHARP_SYMBOL))) => {
            Some(((natural + 1) % 12, &text[after_letter + c.len_utf8()..]))
        }
        Some((_, c @ ('b' | FLAT_SYMBOL))) => {
            Some(((natural + 11) % 12, &text[after_letter + c.len_utf8()..]))
        }
        _ => Some((natural, &text[after_letter..])),
    }
}

/// Parse a complete note name ("F#", "Bb", "E♭"). Trailing text is an error.
pub fn parse_note(text: &str) -> Option<u8> {
    match split_note_prefix(text) {
        Some((pc, "")) => Some(pc),
        _ => None,
    }
}

/// Replace ASCII accidentals with Unicode symbols in every chord or note
/// symbol of `text`: "Bbm" -> "B♭m", "'F#7' resolves" -> "'F♯7' resolves".
///
/// `text` may be a single symbol or running prose. It is split into tokens
/// at characters that never occur in a symbol (spaces, quotes, punctuation).
/// Only the accidental right after a root letter is converted, and only
/// when the rest of the token looks like a quality suffix, so "m7b5" keeps
/// its inner `b` and a word such as "About" is left alone.
pub fn to_unicode_symbols(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut token_start = None;
    for (i, c) in text.char_indices() {
        match (is_symbol_char(c), token_start) {
            (true, None) => token_start = Some(i),
            (true, Some(_)) => {}
            (false, Some(start)) => {
                push_token(&mut out, &text[start..i]);
                token_start = None;
                out.push(c);
            }
            (false, None) => out.push(c),
        }
    }
    if let Some(start) = token_start {
        push_token(&mut out, &text[start..]);
    }
    out
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '#' | '+' | '°' | 'ø' | 'Δ' | SHARP_SYMBOL | FLAT_SYMBOL)
}

/// Characters of the standard quality tokens ("maj7", "dim", "m7b5", "+").
fn is_quality_char(c: char) -> bool {
    c.is_ascii_digit()
        || matches!(
            c,
            'a' | 'b' | 'd' | 'g' | 'i' | 'j' | 'm' | 'n' | 'o' | 'u' | 'M' | '+' | '°' | 'ø' | 'Δ'
        )
}

fn push_token(out: &mut String, token: &str) {
    let mut chars = token.chars();
    let (Some(letter), Some(accidental)) = (chars.next(), chars.next()) else {
        out.push_str(token);
        return;
    };
    let tail = chars.as_str();
    let symbol = match accidental {
        '#' => Some(SHARP_SYMBOL),
        'b' => Some(FLAT_SYMBOL),
        _ => None,
    };
    match symbol {
        Some(symbol)
            if letter_pitch_class(letter).is_some() && tail.chars().all(is_quality_char) =>
        {
            out.push(letter);
            out.push(symbol);
            out.push_str(tail);
        }
        _ => out.push_str(token),
    }
}

/// Inverse of [`to_unicode_symbols`].
pub fn from_unicode_symbols(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| match c {
            SHARP_SYMBOL => '#',
            FLAT_SYMBOL => 'b',
            other => other,
        })
        .collect()
}
