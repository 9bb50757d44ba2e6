//! Prompt templates. Placeholders are `{conversation}`, `{summary}` and `{workflows}`.

pub const SUMMARY_PROMPT: &str = r#"You analyse workplace interviews to find where an employee's daily work could be streamlined.

Below is a conversation between an AI interviewer and an employee about their role and routine tasks.
Respond with a single JSON object shaped exactly like this:

{
  "employee_profile": {
    "role_summary": "one-line description of the role",
    "key_responsibilities": ["main duties mentioned"],
    "tools_and_systems": ["software, tools or systems in use"],
    "pain_points": ["frustrations or blockers raised"]
  },
  "workflow_analysis": {
    "identified_workflows": ["distinct processes described"],
    "repetitive_tasks": ["work that recurs on a schedule"],
    "manual_processes": ["slow or hand-driven steps"],
    "automation_potential": "high | medium | low"
  },
  "conversation_quality": {
    "engagement_level": "high | medium | low",
    "depth_of_responses": "detailed | moderate | brief",
    "total_exchanges": 0
  },
  "key_insights": ["notable observations about the work"],
  "suggested_actions": ["recommended follow-ups or improvements"],
  "overall_summary": "two or three sentences covering the role and its workflows"
}

CONVERSATION:
{conversation}

Output the JSON object only, without Markdown or code fences."#;

pub const SKILL_PROMPT: &str = r#"You write skill files that let a coding assistant carry out a recorded business workflow.

Using the interview summary and workflows below, write one complete skill file in Markdown containing:
- a title line of the form `# Skill: <name>`
- a short description of what the skill accomplishes
- an Inputs section naming source systems, formats and triggers
- an Outputs section naming destination systems and formats
- numbered, step-by-step instructions for the assistant
- any caveats worth knowing

INTERVIEW SUMMARY:
{summary}

IDENTIFIED WORKFLOWS:
{workflows}

Output only the Markdown for the skill file."#;

pub fn summary_prompt(conversation: &str) -> String {
    SUMMARY_PROMPT.replace("{conversation}", conversation)
}

pub fn skill_prompt(summary: &str, workflows: &str) -> String {
    SKILL_PROMPT
        .replace("{summary}", summary)
        .replace("{workflows}", workflows)
}
