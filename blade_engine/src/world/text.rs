use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::callback::ActionCallback;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextType {
    #[default]
    Talk,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub kind: TextType,
    /// Actor the line is anchored to, if any.
    #[serde(default)]
    pub speaker: Option<String>,
    pub duration: f32,
    #[serde(default)]
    pub callback: Option<ActionCallback>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ActiveSubtitle {
    subtitle: Subtitle,
    remaining: f32,
}

/// Shows subtitles one at a time, in the order they were queued, and fires
/// each subtitle's callback once it leaves the screen.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TextManager {
    current: Option<ActiveSubtitle>,
    queue: VecDeque<Subtitle>,
}

impl TextManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subtitle(&mut self, subtitle: Subtitle) {
        if self.current.is_none() {
            self.current = Some(ActiveSubtitle {
                remaining: subtitle.duration,
                subtitle,
            });
        } else {
            self.queue.push_back(subtitle);
        }
    }

    pub fn current(&self) -> Option<&Subtitle> {
        self.current.as_ref().map(|active| &active.subtitle)
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Advances the on-screen subtitle. Returns the finished subtitles.
    pub fn update(&mut self, dt: f32) -> Vec<Subtitle> {
        let mut finished = Vec::new();
        if let Some(active) = self.current.as_mut() {
            active.remaining -= dt;
            if active.remaining <= 0.0 {
                if let Some(done) = self.advance() {
                    finished.push(done);
                }
            }
        }
        finished
    }

    /// Ends the on-screen subtitle immediately (player click).
    pub fn skip(&mut self) -> Option<Subtitle> {
        self.advance()
    }

    /// Drops every subtitle without firing callbacks.
    pub fn clear(&mut self) {
        self.current = None;
        self.queue.clear();
    }

    fn advance(&mut self) -> Option<Subtitle> {
        let done = self.current.take()?;
        self.current = self.queue.pop_front().map(|subtitle| ActiveSubtitle {
            remaining: subtitle.duration,
            subtitle,
        });
        Some(done.subtitle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::RunnerId;

    fn line(text: &str, duration: f32, ticket: Option<u32>) -> Subtitle {
        Subtitle {
            text: text.to_string(),
            x: 0.0,
            y: 0.0,
            kind: TextType::Talk,
            speaker: None,
            duration,
            callback: ticket.map(|ticket| ActionCallback::new(RunnerId(1), ticket)),
        }
    }

    #[test]
    fn subtitles_play_in_order() {
        let mut text = TextManager::new();
        text.add_subtitle(line("first", 1.0, Some(1)));
        text.add_subtitle(line("second", 0.5, None));
        assert_eq!(text.current().map(|s| s.text.as_str()), Some("first"));
        assert_eq!(text.queued(), 1);

        assert!(text.update(0.5).is_empty());
        let done = text.update(0.5);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].callback.map(|cb| cb.ticket), Some(1));
        assert_eq!(text.current().map(|s| s.text.as_str()), Some("second"));

        let done = text.update(0.5);
        assert_eq!(done[0].text, "second");
        assert!(text.current().is_none());
    }

    #[test]
    fn skip_ends_current_line() {
        let mut text = TextManager::new();
        text.add_subtitle(line("long", 10.0, Some(4)));
        let skipped = text.skip().expect("subtitle on screen");
        assert_eq!(skipped.text, "long");
        assert!(text.skip().is_none());
    }
}
