// Prompts for match explanation generation. Each service that needs LLM
// calls defines its own prompts.rs alongside it.

pub const EXPLAIN_SYSTEM: &str = "You are a concise recruiting assistant. \
    You explain why a candidate is a strong match for a specific job posting. \
    Respond with 2-3 plain sentences. \
    Do NOT use markdown, bullet points, or headings. \
    Do NOT invent skills or experience not present in the provided resume.";

pub const EXPLAIN_PROMPT_TEMPLATE: &str = "\
Job title: {job_title}
Match score: {match_score}/100
Skills the candidate has that the job requires: {matched_skills}
Required skills the candidate is missing: {missed_skills}

Resume excerpt:
{resume_excerpt}

In 2-3 sentences, explain why this candidate is a strong match for this job. \
Mention the overlapping skills concretely and, if relevant, note the most \
significant gap.";
