// src/matcher/prompts.rs
// Prompt constants and builders for the scoring backend.

/// System prompt that enforces JSON-only output for scoring calls.
pub const SCORING_SYSTEM: &str = "You are a professional job matching assistant. \
    You analyze a resume against a job description and return a matching score. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object.";

/// System prompt for cover letter generation.
pub const COVER_LETTER_SYSTEM: &str = "You are a professional career writer. \
    You write tailored, concrete cover letters grounded in the candidate's \
    actual resume. Respond with the cover letter text only.";

/// Build the scoring prompt. The backend must answer with
/// `{"score": <0-100 integer>, "rationale": "<one short paragraph>"}`.
pub fn scoring_prompt(resume_text: &str, job_text: &str) -> String {
    format!(
        "Analyze how well this resume matches the job description and return a \
         matching score from 0 to 100, where 100 is a perfect fit.\n\n\
         Respond with ONLY a JSON object in this exact format:\n\
         {{\"score\": 80, \"rationale\": \"one short paragraph explaining the score\"}}\n\n\
         Job Description:\n{job_text}\n\n\
         Resume:\n{resume_text}"
    )
}

/// Build the cover letter prompt. At least two paragraphs, no
/// address/signature boilerplate.
pub fn cover_letter_prompt(resume_text: &str, job_text: &str) -> String {
    format!(
        "Write a cover letter for the job below, based on the resume. \
         The letter must be at least two paragraphs. Skip the name, address \
         and signature blocks at the start and end; return body text only.\n\n\
         Job Description:\n{job_text}\n\n\
         Resume:\n{resume_text}"
    )
}
