//! Question generation prompt

use serde_json::Value;

use super::types::GenerationRequest;

/// Render the model prompt for `request`
///
/// Deterministic: the same request always yields the same text. History
/// records keep their original key order.
pub fn render_prompt(request: &GenerationRequest) -> String {
    let previous = Value::Array(request.existing_questions.clone());

    format!(
        concat!(
            "I'm creating a trivia game and need questions and answers generated on the topic of {topic}. ",
            "Can you generate question and answer pairs using the following rules outlined below?\n",
            "        <RULES>\n",
            "           1. Generate {count} {difficulty} questions with each question having four answers, only one of which is correct\n",
            "           2. {silly} of the questions should have one silly answer, but the others should not.\n",
            "           3. Provide the questions and answers as a JSON array, and indicate which is the correct answer for each question by assigning it a key called correctAnswer. \n",
            "           4. Ensure that the correct answer is one of the answers supplied. \n",
            "           5. Skip the preamble in the output.\n",
            "           6. Ensure that there are no questions and answers that have been asked before by comparing them with the previously asked questions supplied.\n",
            "        </RULES>\n",
            "        <PREVIOUSLY-ASKED-QUESTIONS>\n",
            "        {previous}\n",
            "        </PREVIOUSLY-ASKED-QUESTIONS>",
        ),
        topic = request.topic,
        count = request.number_questions,
        difficulty = request.difficulty,
        silly = request.num_silly,
        previous = previous,
    )
}
