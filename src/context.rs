//! Deck hierarchy context for generation prompts.

/// Render the deck hierarchy and the rules that keep cards inside it.
///
/// `deck_chain` holds display titles and `deck_topics` the parallel topic
/// labels, root first. An empty chain means a top-level deck and yields an
/// empty string.
pub fn build_contextual_constraints(
    deck_chain: &[String],
    deck_topics: &[String],
    full_path: &str,
) -> String {
    if deck_chain.is_empty() {
        return String::new();
    }

    let last = deck_chain.len() - 1;
    let levels: Vec<String> = deck_chain
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let topic = deck_topics
                .get(i)
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(title);
            let (label, role) = match i {
                0 => ("Root".to_string(), "Defines overall domain"),
                i if i == last => ("Current".to_string(), "Specific focus"),
                i => (format!("Level {}", i), "Refines context"),
            };
            format!("- {}: {} (topic: {}) - {}", label, title, topic, role)
        })
        .collect();

    let path = if full_path.trim().is_empty() {
        deck_chain.join(" > ")
    } else {
        full_path.to_string()
    };
    let current = &deck_chain[last];

    let mut rules = vec![format!(
        "MANDATORY: Every card must be specific to the current context \"{}\"",
        current
    )];
    if last > 0 {
        rules.push(format!(
            "Every card must remain valid within the parent category \"{}\"",
            deck_chain[last - 1]
        ));
    }
    rules.push(format!("Every card must follow the full hierarchy path: {}", path));
    rules.push(
        "Do NOT generate generic content or content that falls outside this hierarchy".to_string(),
    );

    let numbered: Vec<String> = rules
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {}", i + 1, rule))
        .collect();

    format!(
        "DECK HIERARCHY:\n{}\n\nFull path: {}\n\nCONTEXT RULES:\n{}",
        levels.join("\n"),
        path,
        numbered.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_chain() {
        assert_eq!(build_contextual_constraints(&[], &[], ""), "");
    }

    #[test]
    fn test_three_level_chain() {
        let chain = strings(&["Korean", "Food", "Slang"]);
        let out = build_contextual_constraints(&chain, &chain, "Korean > Food > Slang");

        assert!(out.contains("Root: Korean"));
        assert!(out.contains("Level 1: Food (topic: Food) - Refines context"));
        assert!(out.contains("Current: Slang (topic: Slang) - Specific focus"));
        assert!(out.contains(
            "1. MANDATORY: Every card must be specific to the current context \"Slang\""
        ));
        assert!(out.contains("2. Every card must remain valid within the parent category \"Food\""));
        assert!(out.contains("3. Every card must follow the full hierarchy path: Korean > Food > Slang"));
        assert!(out.contains("4. Do NOT generate generic content"));
    }

    #[test]
    fn test_single_deck_has_no_parent_rule() {
        let chain = strings(&["Biology"]);
        let out = build_contextual_constraints(&chain, &chain, "Biology");

        assert!(out.contains("Root: Biology (topic: Biology) - Defines overall domain"));
        assert!(!out.contains("Current:"));
        assert!(!out.contains("parent category"));
        assert!(out.contains("3. Do NOT generate generic content"));
    }

    #[test]
    fn test_topics_differ_from_titles() {
        let chain = strings(&["Languages", "My Korean Deck"]);
        let topics = strings(&["Languages", "Korean"]);
        let out = build_contextual_constraints(&chain, &topics, "Languages > My Korean Deck");
        assert!(out.contains("Current: My Korean Deck (topic: Korean)"));
    }

    #[test]
    fn test_missing_topics_and_path_fall_back_to_titles() {
        let chain = strings(&["History", "Joseon"]);
        let out = build_contextual_constraints(&chain, &[], "");
        assert!(out.contains("Current: Joseon (topic: Joseon)"));
        assert!(out.contains("Full path: History > Joseon"));
    }

    #[test]
    fn test_deterministic() {
        let chain = strings(&["Korean", "Food", "Slang"]);
        assert_eq!(
            build_contextual_constraints(&chain, &chain, "Korean > Food > Slang"),
            build_contextual_constraints(&chain, &chain, "Korean > Food > Slang")
        );
    }
}
