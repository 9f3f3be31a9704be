//! In-place edits of a full deck. Callers persist the result with
//! [`DeckSource::replace`](crate::sources::DeckSource::replace).

use rand::Rng;
use thiserror::Error;

use super::slide::{AnnouncementSlide, SlideContent, collapse_whitespace};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeckEditError {
    #[error("no slide with id '{0}'")]
    UnknownSlide(String),

    #[error("slide '{0}' cannot move further")]
    AtEdge(String),
}

/// Which way [`move_slide`] shifts a slide
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Random lowercase base-36 slide id
#[must_use]
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
        .collect()
}

fn index_of(deck: &[AnnouncementSlide], id: &str) -> Result<usize, DeckEditError> {
    deck.iter()
        .position(|s| s.id == id)
        .ok_or_else(|| DeckEditError::UnknownSlide(id.to_string()))
}

/// Append an empty visible slide titled `Quadro N`
pub fn add_slide(deck: &mut Vec<AnnouncementSlide>) -> &AnnouncementSlide {
    let title = format!("Quadro {}", deck.len() + 1);
    deck.push(AnnouncementSlide::new(generate_id(), title));
    &deck[deck.len() - 1]
}

/// Remove a slide. Removing the last one leaves a fresh `Quadro 1` behind.
pub fn remove_slide(deck: &mut Vec<AnnouncementSlide>, id: &str) -> Result<(), DeckEditError> {
    let idx = index_of(deck, id)?;
    deck.remove(idx);
    if deck.is_empty() {
        deck.push(AnnouncementSlide::new(generate_id(), "Quadro 1"));
    }
    Ok(())
}

/// Flip visibility, returning the new value
pub fn toggle_visibility(
    deck: &mut [AnnouncementSlide],
    id: &str,
) -> Result<bool, DeckEditError> {
    let idx = index_of(deck, id)?;
    let slide = &mut deck[idx];
    slide.is_visible = !slide.is_visible;
    Ok(slide.is_visible)
}

pub fn set_visibility(
    deck: &mut [AnnouncementSlide],
    id: &str,
    visible: bool,
) -> Result<(), DeckEditError> {
    let idx = index_of(deck, id)?;
    deck[idx].is_visible = visible;
    Ok(())
}

pub fn move_slide(
    deck: &mut [AnnouncementSlide],
    id: &str,
    direction: Direction,
) -> Result<(), DeckEditError> {
    let idx = index_of(deck, id)?;
    let target = match direction {
        Direction::Up => idx.checked_sub(1),
        Direction::Down => Some(idx + 1).filter(|&t| t < deck.len()),
    };
    let target = target.ok_or_else(|| DeckEditError::AtEdge(id.to_string()))?;
    deck.swap(idx, target);
    Ok(())
}

pub fn rename_slide(
    deck: &mut [AnnouncementSlide],
    id: &str,
    title: &str,
) -> Result<(), DeckEditError> {
    let idx = index_of(deck, id)?;
    deck[idx].title = title.trim().to_string();
    Ok(())
}

/// Replace a slide's content; its label follows the rich-text title
pub fn set_content(
    deck: &mut [AnnouncementSlide],
    id: &str,
    content: SlideContent,
) -> Result<(), DeckEditError> {
    let idx = index_of(deck, id)?;
    let slide = &mut deck[idx];
    slide.title = title_from_content(&content, &slide.title);
    slide.content = content;
    Ok(())
}

/// Label derived from the rich-text title, or `fallback` when it is blank
#[must_use]
pub fn title_from_content(content: &SlideContent, fallback: &str) -> String {
    content
        .title
        .as_ref()
        .map(|t| collapse_whitespace(&t.plain_text()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::RichText;

    fn deck(ids: &[&str]) -> Vec<AnnouncementSlide> {
        ids.iter()
            .map(|id| AnnouncementSlide::new(*id, id.to_uppercase()))
            .collect()
    }

    fn ids(deck: &[AnnouncementSlide]) -> Vec<&str> {
        deck.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn generated_ids_are_nine_base36_chars() {
        let id = generate_id();
        assert_eq!(id.len(), 9);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn added_slides_are_numbered_after_the_deck() {
        let mut d = deck(&["a", "b"]);
        let added = add_slide(&mut d);
        assert_eq!(added.title, "Quadro 3");
        assert!(added.is_visible);
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn removing_the_last_slide_leaves_a_default() {
        let mut d = deck(&["a"]);
        remove_slide(&mut d, "a").unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].title, "Quadro 1");
        assert_ne!(d[0].id, "a");
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut d = deck(&["a"]);
        assert_eq!(
            remove_slide(&mut d, "zz"),
            Err(DeckEditError::UnknownSlide("zz".into()))
        );
    }

    #[test]
    fn moves_stop_at_the_edges() {
        let mut d = deck(&["a", "b", "c"]);
        move_slide(&mut d, "c", Direction::Up).unwrap();
        assert_eq!(ids(&d), vec!["a", "c", "b"]);
        assert_eq!(
            move_slide(&mut d, "a", Direction::Up),
            Err(DeckEditError::AtEdge("a".into()))
        );
        assert!(move_slide(&mut d, "b", Direction::Down).is_err());
    }

    #[test]
    fn toggle_flips_visibility() {
        let mut d = deck(&["a"]);
        assert_eq!(toggle_visibility(&mut d, "a"), Ok(false));
        assert_eq!(toggle_visibility(&mut d, "a"), Ok(true));
    }

    #[test]
    fn content_title_replaces_label_unless_blank() {
        let mut d = deck(&["a"]);
        let content = SlideContent {
            title: Some(RichText::paragraph(" Plantão \n de sábado ")),
            ..SlideContent::default()
        };
        set_content(&mut d, "a", content).unwrap();
        assert_eq!(d[0].title, "Plantão de sábado");

        let blank = SlideContent {
            title: Some(RichText::paragraph("   ")),
            ..SlideContent::default()
        };
        set_content(&mut d, "a", blank).unwrap();
        assert_eq!(d[0].title, "Plantão de sábado");
    }
}
