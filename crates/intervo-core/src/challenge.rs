// Coding challenge types and the built-in role catalog
//
// A challenge is normally produced by the narrative collaborator as a
// JSON document; when generation fails or returns something that does
// not parse, a fixed built-in challenge keyed by role category
// substitutes so the coding stage always has a problem to present.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EngineError, Result};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Worked example shown alongside the problem statement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ChallengeExample {
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// One hidden test case the submission is executed against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TestCase {
    pub input: String,
    pub expected: String,
}

/// The problem presented during the coding stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CodingChallenge {
    pub title: String,
    pub description: String,
    pub difficulty: String,
    #[serde(default)]
    pub examples: Vec<ChallengeExample>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    /// Per-language starter code, keyed by language tag
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub starter_code: HashMap<String, String>,
}

/// Wire shape the challenge generator is prompted to produce
#[derive(Debug, Deserialize)]
struct GeneratedChallenge {
    title: String,
    #[serde(alias = "question")]
    description: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    examples: Vec<ChallengeExample>,
    #[serde(default)]
    constraints: Vec<String>,
    #[serde(default, alias = "testCases")]
    test_cases: Vec<TestCase>,
}

impl CodingChallenge {
    /// Parse a generator response into a challenge.
    ///
    /// The generator is asked for bare JSON but frequently wraps it in
    /// markdown code fences; those are stripped before parsing. A
    /// response that still does not parse is surfaced as a generation
    /// error so the caller can substitute the built-in challenge.
    pub fn from_generated(text: &str) -> Result<CodingChallenge> {
        let json = strip_code_fences(text);
        let parsed: GeneratedChallenge = serde_json::from_str(json.trim())
            .map_err(|e| EngineError::generation(format!("challenge did not parse: {}", e)))?;
        Ok(CodingChallenge {
            title: parsed.title,
            description: parsed.description,
            difficulty: parsed.difficulty.unwrap_or_else(|| "Medium".to_string()),
            examples: parsed.examples,
            constraints: parsed.constraints,
            test_cases: parsed.test_cases,
            starter_code: HashMap::new(),
        })
    }
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.split_once("```json").map(|(_, r)| r) {
        rest.split("```").next().unwrap_or(rest)
    } else if let Some(rest) = trimmed.split_once("```").map(|(_, r)| r) {
        rest.split("```").next().unwrap_or(rest)
    } else {
        trimmed
    }
}

/// Role category used to key scripted questions and fallback challenges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleCategory {
    Frontend,
    Backend,
    Fullstack,
}

impl RoleCategory {
    /// Classify a free-form role name
    pub fn from_role(role: &str) -> RoleCategory {
        let lower = role.to_lowercase();
        if lower.contains("frontend") || lower.contains("front-end") || lower.contains("front end")
        {
            RoleCategory::Frontend
        } else if lower.contains("backend")
            || lower.contains("back-end")
            || lower.contains("back end")
        {
            RoleCategory::Backend
        } else {
            RoleCategory::Fullstack
        }
    }
}

/// Static role profile: display name, skills, scripted technical
/// questions, and the built-in fallback challenge
pub struct RoleProfile {
    pub name: &'static str,
    pub skills: &'static [&'static str],
    pub technical_questions: [&'static str; 3],
}

impl RoleProfile {
    pub fn for_category(category: RoleCategory) -> &'static RoleProfile {
        match category {
            RoleCategory::Frontend => &FRONTEND_PROFILE,
            RoleCategory::Backend => &BACKEND_PROFILE,
            RoleCategory::Fullstack => &FULLSTACK_PROFILE,
        }
    }

    /// Scripted question for a 1-based question index
    pub fn scripted_question(&self, index: u32) -> &'static str {
        let i = (index.saturating_sub(1) as usize).min(2);
        self.technical_questions[i]
    }
}

static FRONTEND_PROFILE: RoleProfile = RoleProfile {
    name: "Frontend Developer",
    skills: &["React", "JavaScript", "HTML", "CSS"],
    technical_questions: [
        "Can you explain the difference between var, let, and const in JavaScript?",
        "What are React hooks and why do we use them?",
        "If a React component keeps re-rendering unnecessarily, what could cause that and how would you fix it?",
    ],
};

static BACKEND_PROFILE: RoleProfile = RoleProfile {
    name: "Backend Developer",
    skills: &["Node.js", "Python", "APIs", "Databases"],
    technical_questions: [
        "Can you explain the difference between SQL and NoSQL databases?",
        "What is middleware in a web framework and how do you use it?",
        "How would you handle authentication in a REST API?",
    ],
};

static FULLSTACK_PROFILE: RoleProfile = RoleProfile {
    name: "Full Stack Developer",
    skills: &["JavaScript", "APIs", "Databases", "React"],
    technical_questions: [
        "How do you decide what logic belongs on the client versus the server?",
        "Walk me through what happens from a browser request to a rendered page in a typical web stack.",
        "How would you design pagination for a large dataset across the API and the UI?",
    ],
};

/// Built-in fallback challenge for a role category
pub fn fallback_challenge(category: RoleCategory) -> CodingChallenge {
    match category {
        RoleCategory::Frontend => CodingChallenge {
            title: "Filter Adults".to_string(),
            description: "Write a function filterAdults(users) that takes an array of user \
                          objects with 'name' and 'age' properties, and returns a new array of \
                          users who are 18 or older, sorted by age."
                .to_string(),
            difficulty: "Medium".to_string(),
            examples: vec![ChallengeExample {
                input: r#"[{"name":"Alice","age":17},{"name":"Bob","age":22},{"name":"Charlie","age":19}]"#.to_string(),
                output: r#"[{"name":"Charlie","age":19},{"name":"Bob","age":22}]"#.to_string(),
                explanation: Some("Alice is under 18 and is dropped; the rest sort by age".to_string()),
            }],
            constraints: vec!["Do not mutate the input array".to_string()],
            test_cases: vec![
                TestCase {
                    input: r#"[{"name":"Alice","age":17},{"name":"Bob","age":22},{"name":"Charlie","age":19}]"#.to_string(),
                    expected: r#"[{"name":"Charlie","age":19},{"name":"Bob","age":22}]"#.to_string(),
                },
                TestCase {
                    input: r#"[{"name":"John","age":15},{"name":"Jane","age":25}]"#.to_string(),
                    expected: r#"[{"name":"Jane","age":25}]"#.to_string(),
                },
            ],
            starter_code: HashMap::from([
                (
                    "javascript".to_string(),
                    "function filterAdults(users) {\n  // Your code here\n  return [];\n}".to_string(),
                ),
                (
                    "python".to_string(),
                    "def filter_adults(users):\n    # Your code here\n    return []".to_string(),
                ),
            ]),
        },
        RoleCategory::Backend => CodingChallenge {
            title: "API Response Parser".to_string(),
            description: "Write a function parseResponses(data) that takes an array of API \
                          response objects and returns only the items with status 'success', \
                          sorted by timestamp."
                .to_string(),
            difficulty: "Medium".to_string(),
            examples: vec![ChallengeExample {
                input: r#"[{"id":1,"status":"success","timestamp":1000},{"id":2,"status":"error","timestamp":900}]"#.to_string(),
                output: r#"[{"id":1,"status":"success","timestamp":1000}]"#.to_string(),
                explanation: Some("Only successful responses survive, ordered by timestamp".to_string()),
            }],
            constraints: vec!["Preserve the original objects".to_string()],
            test_cases: vec![TestCase {
                input: r#"[{"id":1,"status":"success","timestamp":1000},{"id":2,"status":"error","timestamp":900}]"#.to_string(),
                expected: r#"[{"id":1,"status":"success","timestamp":1000}]"#.to_string(),
            }],
            starter_code: HashMap::from([
                (
                    "javascript".to_string(),
                    "function parseResponses(data) {\n  // Your code here\n  return [];\n}".to_string(),
                ),
                (
                    "python".to_string(),
                    "def parse_responses(data):\n    # Your code here\n    return []".to_string(),
                ),
            ]),
        },
        RoleCategory::Fullstack => CodingChallenge {
            title: "Two Sum".to_string(),
            description: "Given an array of integers and a target sum, return the indices of two \
                          numbers that add up to the target. You may assume each input has \
                          exactly one solution."
                .to_string(),
            difficulty: "Easy".to_string(),
            examples: vec![ChallengeExample {
                input: "[2,7,11,15], target=9".to_string(),
                output: "[0,1]".to_string(),
                explanation: Some("2 + 7 = 9".to_string()),
            }],
            constraints: vec![
                "Each input has exactly one solution".to_string(),
                "Cannot use the same element twice".to_string(),
            ],
            test_cases: vec![
                TestCase {
                    input: "[2,7,11,15]\n9".to_string(),
                    expected: "[0,1]".to_string(),
                },
                TestCase {
                    input: "[3,2,4]\n6".to_string(),
                    expected: "[1,2]".to_string(),
                },
            ],
            starter_code: HashMap::from([
                (
                    "javascript".to_string(),
                    "function twoSum(nums, target) {\n  // Your code here\n  return [];\n}".to_string(),
                ),
                (
                    "python".to_string(),
                    "def two_sum(nums, target):\n    # Your code here\n    return []".to_string(),
                ),
            ]),
        },
    }
}
