//! The members of one competition.

use colosseum_types::{PlayerId, Role};

/// Players in a competition and their roles, in join order.
///
/// Rosters are small (a handful to a few dozen players), so a vector beats
/// a map and keeps iteration order stable for announcements.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: Vec<(PlayerId, Role)>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.members.iter().any(|(p, _)| *p == player)
    }

    pub fn role(&self, player: PlayerId) -> Option<Role> {
        self.members
            .iter()
            .find(|(p, _)| *p == player)
            .map(|(_, role)| *role)
    }

    /// Returns `false` if the player was already a member.
    pub(crate) fn insert(&mut self, player: PlayerId, role: Role) -> bool {
        if self.contains(player) {
            return false;
        }
        self.members.push((player, role));
        true
    }

    pub(crate) fn remove(&mut self, player: PlayerId) -> Option<Role> {
        let index = self.members.iter().position(|(p, _)| *p == player)?;
        Some(self.members.remove(index).1)
    }

    pub(crate) fn drain(&mut self) -> Vec<(PlayerId, Role)> {
        std::mem::take(&mut self.members)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, Role)> + '_ {
        self.members.iter().copied()
    }

    pub fn players(&self) -> Vec<PlayerId> {
        self.members.iter().map(|(p, _)| *p).collect()
    }

    /// Members with [`Role::Playing`], in join order.
    pub fn playing(&self) -> Vec<PlayerId> {
        self.with_role(Role::Playing)
    }

    pub fn spectators(&self) -> Vec<PlayerId> {
        self.with_role(Role::Spectating)
    }

    pub fn playing_count(&self) -> usize {
        self.count(Role::Playing)
    }

    pub fn spectator_count(&self) -> usize {
        self.count(Role::Spectating)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn with_role(&self, role: Role) -> Vec<PlayerId> {
        self.members
            .iter()
            .filter(|(_, r)| *r == role)
            .map(|(p, _)| *p)
            .collect()
    }

    fn count(&self, role: Role) -> usize {
        self.members.iter().filter(|(_, r)| *r == role).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut roster = Roster::new();
        assert!(roster.insert(PlayerId(1), Role::Playing));
        assert!(!roster.insert(PlayerId(1), Role::Spectating));
        assert_eq!(roster.role(PlayerId(1)), Some(Role::Playing));
    }

    #[test]
    fn test_counts_by_role_in_join_order() {
        let mut roster = Roster::new();
        roster.insert(PlayerId(3), Role::Playing);
        roster.insert(PlayerId(1), Role::Spectating);
        roster.insert(PlayerId(2), Role::Playing);

        assert_eq!(roster.playing(), vec![PlayerId(3), PlayerId(2)]);
        assert_eq!(roster.spectators(), vec![PlayerId(1)]);
        assert_eq!(roster.playing_count(), 2);
        assert_eq!(roster.spectator_count(), 1);
    }

    #[test]
    fn test_remove_and_drain() {
        let mut roster = Roster::new();
        roster.insert(PlayerId(1), Role::Playing);
        roster.insert(PlayerId(2), Role::Spectating);

        assert_eq!(roster.remove(PlayerId(1)), Some(Role::Playing));
        assert_eq!(roster.remove(PlayerId(1)), None);

        let drained = roster.drain();
        assert_eq!(drained, vec![(PlayerId(2), Role::Spectating)]);
        assert!(roster.is_empty());
    }
}
