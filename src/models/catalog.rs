//! Fixed vocabularies shared by the create and update validation paths.
//! Defined once so the two paths cannot drift.

pub const PLATFORMS: [&str; 7] = [
    "LeetCode",
    "Codeforces",
    "GeeksforGeeks",
    "HackerRank",
    "CodeChef",
    "AtCoder",
    "Other",
];

pub const TOPICS: [&str; 28] = [
    "Array",
    "String",
    "Hash Table",
    "Dynamic Programming",
    "Math",
    "Sorting",
    "Greedy",
    "Depth-First Search",
    "Breadth-First Search",
    "Tree",
    "Binary Search",
    "Matrix",
    "Two Pointers",
    "Bit Manipulation",
    "Stack",
    "Heap",
    "Graph",
    "Design",
    "Backtracking",
    "Sliding Window",
    "Union Find",
    "Trie",
    "Recursion",
    "Binary Tree",
    "Binary Search Tree",
    "Linked List",
    "Queue",
    "Other",
];

pub const DIFFICULTIES: [&str; 3] = ["Easy", "Medium", "Hard"];

pub const SOLUTION_LANGUAGES: [&str; 4] = ["cpp", "python", "java", "javascript"];

pub fn is_valid_platform(platform: &str) -> bool {
    PLATFORMS.contains(&platform)
}

pub fn is_valid_difficulty(difficulty: &str) -> bool {
    DIFFICULTIES.contains(&difficulty)
}

pub fn is_valid_language(language: &str) -> bool {
    SOLUTION_LANGUAGES.contains(&language)
}

/// Returns the subset of `topics` not present in the taxonomy.
pub fn invalid_topics<'a>(topics: &'a [String]) -> Vec<&'a str> {
    topics
        .iter()
        .map(String::as_str)
        .filter(|t| !TOPICS.contains(t))
        .collect()
}

/// Problem links must be absolute http(s) URLs.
pub fn is_valid_link(link: &str) -> bool {
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"));
    matches!(rest, Some(r) if !r.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_platform_accepted() {
        assert!(is_valid_platform("LeetCode"));
        assert!(is_valid_platform("Other"));
    }

    #[test]
    fn unknown_platform_rejected() {
        assert!(!is_valid_platform("TopCoder"));
        assert!(!is_valid_platform("leetcode"));
    }

    #[test]
    fn taxonomy_has_28_terms() {
        assert_eq!(TOPICS.len(), 28);
    }

    #[test]
    fn invalid_topics_filters_unknown_terms() {
        let topics = vec![
            "Array".to_string(),
            "Quantum".to_string(),
            "Graph".to_string(),
        ];
        assert_eq!(invalid_topics(&topics), vec!["Quantum"]);
    }

    #[test]
    fn link_requires_scheme_and_host() {
        assert!(is_valid_link("https://leetcode.com/problems/two-sum"));
        assert!(is_valid_link("http://example.com"));
        assert!(!is_valid_link("not-a-url"));
        assert!(!is_valid_link("ftp://example.com"));
        assert!(!is_valid_link("https://"));
    }
}
