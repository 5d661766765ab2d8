// ABOUTME: Shared utility functions for Questline
// ABOUTME: ID generation for quests, task groups, and tasks

/// Generate a unique entity ID
pub fn generate_id() -> String {
    nanoid::nanoid!()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_is_unique() {
        let id1 = generate_id();
        let id2 = generate_id();
        assert_ne!(id1, id2);
        assert!(!id1.is_empty());
    }
}
