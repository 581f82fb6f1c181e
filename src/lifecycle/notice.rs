//! Styled user-facing messages.
//!
//! A `Notice` is an ordered list of colored text segments. It renders to
//! plain text for logs, to section-sign color codes, and to the chat
//! component JSON game clients display on disconnect.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::BackendId;

/// The sixteen named chat colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

impl NamedColor {
    /// Legacy formatting code (the character after `§`).
    pub fn legacy_code(&self) -> char {
        match self {
            NamedColor::Black => '0',
            NamedColor::DarkBlue => '1',
            NamedColor::DarkGreen => '2',
            NamedColor::DarkAqua => '3',
            NamedColor::DarkRed => '4',
            NamedColor::DarkPurple => '5',
            NamedColor::Gold => '6',
            NamedColor::Gray => '7',
            NamedColor::DarkGray => '8',
            NamedColor::Blue => '9',
            NamedColor::Green => 'a',
            NamedColor::Aqua => 'b',
            NamedColor::Red => 'c',
            NamedColor::LightPurple => 'd',
            NamedColor::Yellow => 'e',
            NamedColor::White => 'f',
        }
    }
}

/// One run of text in a single color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub color: NamedColor,
}

/// A multi-segment styled message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notice {
    segments: Vec<Segment>,
}

#[derive(Serialize)]
struct Component<'a> {
    text: &'static str,
    extra: &'a [Segment],
}

impl Notice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment.
    pub fn push(mut self, text: impl Into<String>, color: NamedColor) -> Self {
        self.segments.push(Segment {
            text: text.into(),
            color,
        });
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Text without styling.
    pub fn to_plain(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Text with `§`-prefixed color codes before every segment.
    pub fn to_legacy(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('\u{a7}');
            out.push(segment.color.legacy_code());
            out.push_str(&segment.text);
        }
        out
    }

    /// Chat component JSON: an empty root with one child per segment.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&Component {
            text: "",
            extra: &self.segments,
        })
    }
}

/// Language of the crash notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en")]
    En,
}

/// Compose the notice shown when `backend` is unreachable and the whole
/// network restarts.
pub fn crash_notice(backend: &BackendId, locale: Locale, retry_after: Duration) -> Notice {
    let minutes = (retry_after.as_secs() / 60).max(1);
    match locale {
        Locale::PtBr => {
            let unit = if minutes == 1 { "minuto" } else { "minutos" };
            Notice::new()
                .push("Um dos nossos servidores", NamedColor::Red)
                .push(" (o servidor \u{201c}", NamedColor::DarkRed)
                .push(backend.as_str(), NamedColor::Gold)
                .push("\u{201d}) ", NamedColor::DarkRed)
                .push("n\u{e3}o respondeu e provavelmente travou!\n", NamedColor::Red)
                .push(
                    "A rede inteira vai reiniciar sozinha. Para isso, todos os servidores \
                     ser\u{e3}o desligados temporariamente.\n",
                    NamedColor::Aqua,
                )
                .push(
                    format!("Tente entrar de novo daqui a {minutes} {unit}. Desculpe pelo transtorno."),
                    NamedColor::Aqua,
                )
                .push(" \u{2639}\n", NamedColor::White)
                .push("(Se o problema continuar, fale com o operador.)", NamedColor::DarkAqua)
        }
        Locale::En => {
            let unit = if minutes == 1 { "minute" } else { "minutes" };
            Notice::new()
                .push("One of our servers", NamedColor::Red)
                .push(" (\u{201c}", NamedColor::DarkRed)
                .push(backend.as_str(), NamedColor::Gold)
                .push("\u{201d}) ", NamedColor::DarkRed)
                .push("could not be reached and has probably crashed!\n", NamedColor::Red)
                .push(
                    "The whole network will restart automatically, so every server is \
                     going down for a moment.\n",
                    NamedColor::Aqua,
                )
                .push(
                    format!("Please try again in {minutes} {unit}. Sorry for the trouble."),
                    NamedColor::Aqua,
                )
                .push(" \u{2639}\n", NamedColor::White)
                .push("(If this keeps happening, contact the operator.)", NamedColor::DarkAqua)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderings() {
        let notice = Notice::new()
            .push("down: ", NamedColor::Red)
            .push("lobby", NamedColor::Gold);

        assert_eq!(notice.to_plain(), "down: lobby");
        assert_eq!(notice.to_legacy(), "\u{a7}cdown: \u{a7}6lobby");
        assert_eq!(
            notice.to_json().unwrap(),
            r#"{"text":"","extra":[{"text":"down: ","color":"red"},{"text":"lobby","color":"gold"}]}"#
        );
    }

    #[test]
    fn test_crash_notice_names_backend() {
        let id = BackendId::new("survival");
        let notice = crash_notice(&id, Locale::En, Duration::from_secs(120));
        let plain = notice.to_plain();

        assert!(plain.contains("survival"));
        assert!(plain.contains("restart"));
        assert!(plain.contains("2 minutes"));
        assert!(notice
            .segments()
            .iter()
            .any(|s| s.text == "survival" && s.color == NamedColor::Gold));
    }

    #[test]
    fn test_crash_notice_pt_br() {
        let id = BackendId::new("criativo");
        let plain = crash_notice(&id, Locale::PtBr, Duration::from_secs(60)).to_plain();
        assert!(plain.contains("criativo"));
        assert!(plain.contains("1 minuto."));
    }

    #[test]
    fn test_locale_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            locale: Locale,
        }
        let w: Wrapper = toml::from_str(r#"locale = "en""#).unwrap();
        assert_eq!(w.locale, Locale::En);
        let w: Wrapper = toml::from_str(r#"locale = "pt-BR""#).unwrap();
        assert_eq!(w.locale, Locale::PtBr);
    }
}
