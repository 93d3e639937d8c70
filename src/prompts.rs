/// System instruction for every judge call. The task-specific grading
/// rubric comes from the prompt file, not from here.
pub const JUDGE_SYSTEM_PROMPT: &str = "You are an impartial judge evaluating \
AI model outputs based on strict criteria.";
