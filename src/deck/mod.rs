//! Announcement board deck: slide records, visibility snapshots and the
//! editing operations used by the `deck` subcommands.

pub mod edit;
pub mod slide;

pub use slide::{
    AnnouncementSlide, LogoPlacement, RichText, SlideContent, SlideLayout, VerticalAlign,
};

/// Id given to the slide created for a fresh or legacy deck
pub const DEFAULT_SLIDE_ID: &str = "default";

/// Title given to the slide created for a fresh or legacy deck
pub const DEFAULT_SLIDE_TITLE: &str = "Quadro Principal";

const WELCOME_TEXT: &str = "Bem-vindo ao Quadro de Avisos!";

/// Deck served when nothing has been stored yet
#[must_use]
pub fn welcome_deck() -> Vec<AnnouncementSlide> {
    let mut slide = AnnouncementSlide::new(DEFAULT_SLIDE_ID, DEFAULT_SLIDE_TITLE);
    slide.content.body = RichText::paragraph(WELCOME_TEXT);
    vec![slide]
}

/// Snapshot of the visible slides of a deck, in deck order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnouncementDeck {
    slides: Vec<AnnouncementSlide>,
}

impl AnnouncementDeck {
    /// Keep only the visible slides of `slides`
    #[must_use]
    pub fn visible(slides: Vec<AnnouncementSlide>) -> Self {
        Self {
            slides: slides.into_iter().filter(|s| s.is_visible).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&AnnouncementSlide> {
        self.slides.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnnouncementSlide> {
        self.slides.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_snapshot_drops_hidden_slides() {
        let mut hidden = AnnouncementSlide::new("b", "B");
        hidden.is_visible = false;
        let deck = AnnouncementDeck::visible(vec![
            AnnouncementSlide::new("a", "A"),
            hidden,
            AnnouncementSlide::new("c", "C"),
        ]);
        let ids: Vec<_> = deck.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn welcome_deck_has_one_visible_slide() {
        let deck = welcome_deck();
        assert_eq!(deck.len(), 1);
        assert_eq!(deck[0].id, DEFAULT_SLIDE_ID);
        assert_eq!(deck[0].body_lines(), vec![WELCOME_TEXT]);
    }
}
