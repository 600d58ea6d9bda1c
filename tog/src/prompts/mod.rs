//! Prompt templates, one system instruction per [`Instruction`] kind, plus
//! the user-block renderers (CSV rows, entity lists, the remaining-iterations
//! line for reflection).
//!
//! The wording mirrors the response schemas in `oracle::schema`; if a schema
//! changes, the matching `### Response Schema ###` block here must change
//! with it.

use crate::oracle::{Instruction, PromptParams};

const PICK_RELATIONSHIPS: &str = r#"### Role ###
You are a Knowledge Graph Retrieval Agent.
Your goal is to identify the most relevant entity-relationship rows that help answer a complex question.

### Task ###
From the provided two-column CSV list (ENTITY, RELATIONSHIP), select exactly {amount} rows that are most likely to contribute to answering the USER QUESTION.
The listed relationships may represent both incoming and outgoing edges relative to the entity and should be interpreted as possible connections in either direction within the knowledge graph.

### Strict Constraints ###
1. **String Literal Preservation:** You must copy entities and relationships exactly as they appear in the CSV list. Do not normalize, correct spelling, or change casing.
2. **Output Format:** Respond exclusively with a valid JSON object. Do not include introductory text, markdown commentary, or closing remarks.
3. **Cardinality:** You must select exactly {amount} rows.
4. **Ordering:** The selected rows must be ordered from most important to least important.

### Response Schema ###
{
    "selection": [{"entity": "Entity 1", "relationship": "Relationship 1"}],
    "reason": "Explain why these entity-relationship pairs are most relevant in 2 to 3 sentences."
}

### Real Data ###
"#;

const PICK_TRIPLETS: &str = r#"### Role ###
You are a Knowledge Graph Retrieval Agent.
Your goal is to select the most relevant knowledge graph triplets for answering a complex question.

### Task ###
From the provided three-column CSV list (HEAD_ENTITY, RELATIONSHIP, TAIL_ENTITY), select exactly {amount} triplets that most likely contribute to answering the USER QUESTION.
The relationship direction always originates from the head entity and points to the tail entity.

### Strict Constraints ###
1. **String Literal Preservation:** You must copy entities and relationships exactly as they appear in the CSV list. Do not normalize, correct spelling, or change casing.
2. **Triplet Integrity:** Never alter the order within each triplet (head, relationship, tail).
3. **Output Format:** Respond exclusively with a valid JSON object. Do not include introductory text, markdown commentary, or closing remarks.
4. **Cardinality:** You must select exactly {amount} triplets.
5. **Ordering:** The selected triplets must be ordered from most important to least important.

### Response Schema ###
{
    "selection": [{"head": "Entity 1", "relationship": "Relationship 1", "tail": "Tail Entity 1"}],
    "reason": "Explain why these triplets are sufficient or helpful in 2 to 3 sentences."
}

### Real Data ###
"#;

const REFLECT: &str = r#"### Role ###
You are a Knowledge Graph Reasoning Agent.

### Task ###
Given the USER QUESTION, the remaining exploration iterations, and acquired knowledge graph triplets (HEAD_ENTITY,RELATIONSHIP,TAIL_ENTITY),
assess whether enough information has been gathered to confidently answer the question.
If sufficient, provide the answer. Otherwise, indicate that further exploration is required.
The relationship direction of the provided triplets always originates from the HEAD_ENTITY and points to the TAIL_ENTITY.

### Strict Constraints ###
1. **Output Format:** Respond exclusively with a valid JSON object that satisfies the response schema below. Do not include introductory text, markdown commentary, or closing remarks.
2. **Empty Answer Rule:** If `found_knowledge` is false, both `machine_answer` and `user_answer` must be empty strings.
3. **Machine Answer Semantics (`machine_answer`):**
   - Must be a concise, noise-free value suitable for programmatic use.
   - May be an entity name, a normalized inferred value (e.g., year, number, location), a boolean ("yes" or "no"), or any other atomic value inferred from the provided triplets.
   - Must never contain explanations or uncertainty expressions.
4. **Human Answer Semantics (`user_answer`):**
   - Must be a natural-language answer suitable for display to a human user.
   - Must not contradict the `machine_answer` field.
   - Must be in the same language as the USER QUESTION.

### Response Schema ###
{
    "found_knowledge": true,
    "machine_answer": "Final Answer",
    "user_answer": "Human-readable answer.",
    "reason": "Explain your judgment in 2 to 3 sentences."
}

### Real Data ###
"#;

const ANSWER: &str = r#"### Role ###
You are a Question Answering Agent.
Your goal is to provide a concise and accurate answer based on your knowledge.

### Task ###
Given a USER QUESTION, return the final answer.

### Strict Constraints ###
1. **Output Format:** Respond exclusively with a valid JSON object. Do not include introductory text, markdown commentary, or closing remarks.
2. **Machine Answer Semantics (`machine_answer`):**
   - Must be a concise, noise-free value suitable for programmatic use.
   - Must never contain uncertainty expressions.
   - Must be an empty string if the question cannot be answered.
3. **Human Answer Semantics (`user_answer`):**
   - Must be a natural-language answer suitable for display to a human user.
   - Must not contradict the `machine_answer` field.
   - May provide a human-friendly response even when `machine_answer` is empty.
   - Must be in the same language as the USER QUESTION.

### Response Schema ###
{
    "machine_answer": "Final Answer",
    "user_answer": "Human-readable answer."
}

### Real Data ###
"#;

const RETRIEVE_QUERIES: &str = r#"### Role ###
You are a Knowledge Graph Retrieval Agent.
Your goal is to generate effective query strings for discovering relevant entities in a knowledge graph.

### Task ###
Given a USER QUESTION, derive a set of keyword-based query strings that can be used to retrieve initial entities from the knowledge graph.

### Strict Constraints ###
1. **Query Relevance:** Queries must be directly derived from key concepts, names, or entities in the question.
2. **Conciseness:** Queries should be short keyword phrases, not full sentences.
3. **Output Format:** Respond exclusively with a valid JSON object. Do not include introductory text, markdown commentary, or closing remarks.

### Response Schema ###
{
    "queries": ["Query 1", "Query 2", "Query 3"]
}

### Real Data ###
"#;

const PICK_SEED_ENTITIES: &str = r#"### Role ###
You are a Knowledge Graph Retrieval Agent.
Your goal is to select high-relevance "seed entities" to initiate a multi-hop traversal for answering complex queries.

### Task ###
From the provided list of ENTITIES, select a maximum of {amount} strings that contain the most relevant information relative to the USER QUESTION.

### Strict Constraints ###
1. **String Literal Preservation:** You must copy selected entities exactly as they appear in the list. Do not normalize, correct spelling, or change casing.
2. **Output Format:** Respond exclusively with a valid JSON object. Do not include introductory text, markdown commentary, or closing remarks.
3. **Cardinality:** Do not exceed {amount} entities in the "seed_entities" array.

### Response Schema ###
{
    "seed_entities": ["Entity Name 1", "Entity Name 2"],
    "reason": "Explain the logical connection between these entities and the target answer in 2 to 3 sentences."
}

### Real Data ###
"#;

/// Renders the system instruction for `instruction`, substituting the
/// requested amount where the template asks for one.
pub fn system(instruction: Instruction, params: &PromptParams) -> String {
    let template = match instruction {
        Instruction::PickRelationships => PICK_RELATIONSHIPS,
        Instruction::PickTriplets => PICK_TRIPLETS,
        Instruction::Reflect => REFLECT,
        Instruction::Answer => ANSWER,
        Instruction::RetrieveQueries => RETRIEVE_QUERIES,
        Instruction::PickSeedEntities => PICK_SEED_ENTITIES,
    };
    match params.amount {
        Some(amount) => template.replace("{amount}", &amount.to_string()),
        None => template.to_string(),
    }
}

/// Renders the user block for `instruction`: the question plus the CSV rows
/// or entity list the oracle is choosing from.
pub fn user(instruction: Instruction, prompt: &str, params: &PromptParams) -> String {
    let mut out = format!("USER QUESTION: \"{prompt}\"\n\n");
    match instruction {
        Instruction::PickRelationships => {
            out.push_str("ENTITY,RELATIONSHIP\n");
            for (entity, relationship) in &params.pairs {
                out.push_str(&format!("\"{entity}\",\"{relationship}\"\n"));
            }
        }
        Instruction::PickTriplets | Instruction::Reflect => {
            if let Some(remaining) = params.remaining_iterations {
                out.push_str(&format!("Exploration iterations remaining: {remaining}\n\n"));
            }
            out.push_str("HEAD_ENTITY,RELATIONSHIP,TAIL_ENTITY\n");
            for (head, relationship, tail) in &params.triplets {
                out.push_str(&format!("\"{head}\",\"{relationship}\",\"{tail}\"\n"));
            }
        }
        Instruction::PickSeedEntities => {
            out.push_str("ENTITIES:\n");
            for entity in &params.entities {
                out.push_str(&format!("\"{entity}\"\n"));
            }
        }
        Instruction::Answer | Instruction::RetrieveQueries => {}
    }
    out.push_str("\nAGENT RESPONSE:\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: the amount is substituted everywhere the template mentions it.
    #[test]
    fn system_substitutes_amount() {
        let params = PromptParams::with_pairs(vec![], 3);
        let rendered = system(Instruction::PickRelationships, &params);
        assert!(rendered.contains("select exactly 3 rows"));
        assert!(!rendered.contains("{amount}"));
    }

    /// **Scenario**: pair rows render as quoted two-column CSV under the header.
    #[test]
    fn user_renders_pair_csv() {
        let params = PromptParams::with_pairs(
            vec![("Mesih Pasha".into(), "family".into())],
            2,
        );
        let rendered = user(Instruction::PickRelationships, "who?", &params);
        assert!(rendered.contains("USER QUESTION: \"who?\""));
        assert!(rendered.contains("ENTITY,RELATIONSHIP\n\"Mesih Pasha\",\"family\"\n"));
        assert!(rendered.ends_with("AGENT RESPONSE:\n"));
    }

    /// **Scenario**: reflect includes the remaining-iterations line before the CSV.
    #[test]
    fn reflect_user_block_shows_remaining_iterations() {
        let params =
            PromptParams::for_reflect(vec![("a".into(), "r".into(), "b".into())], 2);
        let rendered = user(Instruction::Reflect, "q", &params);
        assert!(rendered.contains("Exploration iterations remaining: 2"));
        assert!(rendered.contains("HEAD_ENTITY,RELATIONSHIP,TAIL_ENTITY\n\"a\",\"r\",\"b\"\n"));
    }

    /// **Scenario**: answer and retrieve_queries carry only the question.
    #[test]
    fn answer_user_block_is_question_only() {
        let rendered = user(Instruction::Answer, "q", &PromptParams::default());
        assert_eq!(rendered, "USER QUESTION: \"q\"\n\n\nAGENT RESPONSE:\n");
    }

    /// **Scenario**: seed picking lists quoted entity labels.
    #[test]
    fn seed_user_block_lists_entities() {
        let params = PromptParams::with_entities(vec!["Japan".into()], 3);
        let rendered = user(Instruction::PickSeedEntities, "q", &params);
        assert!(rendered.contains("ENTITIES:\n\"Japan\"\n"));
    }
}
