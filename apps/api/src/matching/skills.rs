//! Skill normalization — folds free-text skill mentions onto canonical names.
//!
//! Both sides of the skill comparison (resume text and posting
//! `required_skills`) pass through the same alias table, so "ES6", "js" and
//! "JavaScript" all land on `javascript` before the set intersection.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

/// Alias → canonical skill mapping (O(1) lookup).
static ALIAS_TO_CANONICAL: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let aliases: &[(&str, &[&str])] = &[
        (
            "javascript",
            &["js", "javascript", "java script", "ecmascript", "es6", "es2015"],
        ),
        ("typescript", &["ts", "typescript", "type script"]),
        ("nodejs", &["node.js", "node js", "nodejs", "node"]),
        ("react", &["reactjs", "react.js", "react js", "react"]),
        ("vue", &["vue.js", "vuejs", "vue js", "vue"]),
        ("angular", &["angularjs", "angular.js", "angular"]),
        ("python", &["python3", "python 3", "py", "python"]),
        ("rust", &["rust", "rustlang", "rust lang"]),
        ("go", &["golang", "go lang", "go"]),
        ("java", &["java", "java8", "java 8", "java11", "java 11"]),
        ("c++", &["c++", "cpp", "cplusplus"]),
        ("c#", &["c#", "csharp", "c sharp", ".net", "dotnet"]),
        ("ruby", &["ruby", "ruby on rails", "rails", "ror"]),
        ("php", &["php", "php7", "php8"]),
        ("sql", &["sql", "structured query language"]),
        ("postgresql", &["postgres", "pg", "postgresql", "postgre sql"]),
        ("mysql", &["my sql", "mysql", "mariadb"]),
        ("mongodb", &["mongo", "mongo db", "mongodb"]),
        ("redis", &["redis cache", "redis"]),
        ("elasticsearch", &["elastic search", "elasticsearch"]),
        ("docker", &["docker", "docker compose", "docker-compose"]),
        ("kubernetes", &["k8s", "kubernetes", "kube"]),
        ("terraform", &["terraform", "tf"]),
        ("aws", &["amazon web services", "amazon aws", "aws cloud", "aws"]),
        ("gcp", &["google cloud platform", "google cloud", "gcp"]),
        ("azure", &["microsoft azure", "ms azure", "azure"]),
        ("linux", &["linux", "gnu/linux", "unix"]),
        ("git", &["git", "github", "gitlab"]),
        ("ci/cd", &["ci/cd", "cicd", "ci cd", "continuous integration"]),
        ("graphql", &["graphql", "graph ql"]),
        ("rest", &["rest", "restful", "rest api", "restful api"]),
        ("grpc", &["grpc", "g rpc"]),
        ("kafka", &["kafka", "apache kafka"]),
        ("spark", &["spark", "apache spark", "pyspark"]),
        ("machine learning", &["machine learning", "ml", "deep learning"]),
        ("django", &["django rest framework", "drf", "django"]),
        ("flask", &["flask"]),
        ("spring", &["spring boot", "springboot", "spring"]),
        ("html", &["html", "html5"]),
        ("css", &["css", "css3", "scss", "sass"]),
    ];

    let mut map = HashMap::new();
    for (canonical, names) in aliases {
        for name in *names {
            map.insert(*name, *canonical);
        }
    }
    map
});

/// Normalizes one skill mention: lowercase, trim, fold through the alias
/// table. Unknown skills pass through lowercased so they still intersect
/// on exact matches.
pub fn normalize_skill(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    match ALIAS_TO_CANONICAL.get(lower.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => lower,
    }
}

/// Normalizes a list of skills into a canonical set, dropping empties.
pub fn normalize_skill_set(raw: &[String]) -> BTreeSet<String> {
    raw.iter()
        .map(|s| normalize_skill(s))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Extracts canonical skills mentioned anywhere in free text by scanning
/// for every known alias at word boundaries.
pub fn extract_skills(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    let mut found = BTreeSet::new();
    for (alias, canonical) in ALIAS_TO_CANONICAL.iter() {
        if contains_term(&lower, alias) {
            found.insert((*canonical).to_string());
        }
    }
    found
}

/// Word-boundary substring search. A boundary is any character that cannot
/// be part of a skill token (letters, digits and `+ # . /` can).
fn contains_term(haystack: &str, term: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(term) {
        let begin = start + pos;
        let end = begin + term.len();
        let before_ok = begin == 0
            || !haystack[..begin]
                .chars()
                .next_back()
                .is_some_and(is_token_char);
        let after_ok = end == haystack.len()
            || !haystack[end..].chars().next().is_some_and(is_token_char);
        if before_ok && after_ok {
            return true;
        }
        start = begin + 1;
        if start >= haystack.len() {
            break;
        }
    }
    false
}

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '/')
}
