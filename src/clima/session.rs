// clima - Municipal weather forecasts from AEMET OpenData
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::municipality::{Municipality, MunicipalityIndex};
use crate::search::search;

/// What a line of input turned out to be.
#[derive(Debug, PartialEq, Eq)]
pub enum Event<'a> {
    /// A suggestion was picked by its 1-based position.
    Select(Municipality),
    /// A number that doesn't match any current suggestion.
    NoSuggestion(usize),
    /// An empty line, which clears the suggestions.
    Dismissed,
    /// Anything else is a search.
    Suggestions(&'a [Municipality]),
}

/// Suggestion state behind the search box.
///
/// Every input event replaces the suggestions. Selecting one or dismissing the list clears it.
#[derive(Debug, Default)]
pub struct SearchSession {
    suggestions: Vec<Municipality>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&mut self, index: &MunicipalityIndex, text: &str) -> &[Municipality] {
        self.suggestions = search(index, text).into_iter().cloned().collect();
        &self.suggestions
    }

    /// Handle one line typed by the user: a number selects, an empty line dismisses, and
    /// anything else searches.
    pub fn line(&mut self, index: &MunicipalityIndex, text: &str) -> Event<'_> {
        let text = text.trim();
        if text.is_empty() {
            self.dismiss();
            return Event::Dismissed;
        }

        if let Ok(position) = text.parse::<usize>() {
            return match self.select(position) {
                Some(m) => Event::Select(m),
                None => Event::NoSuggestion(position),
            };
        }

        Event::Suggestions(self.input(index, text))
    }

    pub fn suggestions(&self) -> &[Municipality] {
        &self.suggestions
    }

    /// Pick the suggestion at 1-based `position`, clearing the list if it exists.
    pub fn select(&mut self, position: usize) -> Option<Municipality> {
        let chosen = position.checked_sub(1).and_then(|i| self.suggestions.get(i)).cloned();
        if chosen.is_some() {
            self.suggestions.clear();
        }

        chosen
    }

    pub fn dismiss(&mut self) {
        self.suggestions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, SearchSession};
    use crate::municipality::{MunicipalityIndex, MunicipalityRecord};

    fn index() -> MunicipalityIndex {
        MunicipalityIndex::from_records(
            [("id28079", "Madrid"), ("id29067", "Málaga"), ("id29069", "Manilva")]
                .iter()
                .map(|(id, name)| MunicipalityRecord {
                    id: id.to_string(),
                    name: name.to_string(),
                }),
        )
    }

    #[test]
    fn test_input_replaces_suggestions() {
        let index = index();
        let mut session = SearchSession::new();

        assert_eq!(1, session.input(&index, "mad").len());
        assert_eq!(1, session.input(&index, "mál").len());
        assert_eq!("Málaga", session.suggestions()[0].name);
        assert!(session.input(&index, "ma").is_empty());
    }

    #[test]
    fn test_select_clears() {
        let index = index();
        let mut session = SearchSession::new();
        session.input(&index, "mad");

        let chosen = session.select(1).unwrap();
        assert_eq!("28079", chosen.code);
        assert!(session.suggestions().is_empty());
    }

    #[test]
    fn test_select_out_of_range() {
        let index = index();
        let mut session = SearchSession::new();
        session.input(&index, "mad");

        assert_eq!(None, session.select(0));
        assert_eq!(None, session.select(2));
        assert_eq!(1, session.suggestions().len());
    }

    #[test]
    fn test_dismiss() {
        let index = index();
        let mut session = SearchSession::new();
        session.input(&index, "mad");
        session.dismiss();

        assert!(session.suggestions().is_empty());
    }

    #[test]
    fn test_line_search() {
        let index = index();
        let mut session = SearchSession::new();

        match session.line(&index, "  mad ") {
            Event::Suggestions(found) => assert_eq!("Madrid", found[0].name),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_line_select() {
        let index = index();
        let mut session = SearchSession::new();
        session.line(&index, "mál");

        match session.line(&index, "1") {
            Event::Select(m) => assert_eq!("29067", m.code),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(session.suggestions().is_empty());
    }

    #[test]
    fn test_line_select_out_of_range() {
        let index = index();
        let mut session = SearchSession::new();
        session.line(&index, "mad");

        assert_eq!(Event::NoSuggestion(5), session.line(&index, "5"));
        assert_eq!(Event::NoSuggestion(0), session.line(&index, "0"));
        assert_eq!(1, session.suggestions().len());
    }

    #[test]
    fn test_line_empty_dismisses() {
        let index = index();
        let mut session = SearchSession::new();
        session.line(&index, "mad");

        assert_eq!(Event::Dismissed, session.line(&index, "   "));
        assert!(session.suggestions().is_empty());
    }

    #[test]
    fn test_line_number_before_search() {
        let mut session = SearchSession::new();
        assert_eq!(Event::NoSuggestion(1), session.line(&index(), "1"));
    }
}
