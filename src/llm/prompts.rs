//! Prompt templates for answer composition

use std::collections::HashMap;

/// Template for generating prompts
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables
    #[must_use]
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        let mut result = self.template.clone();
        for var in &self.variables {
            if let Some(value) = values.get(var) {
                result = result.replace(&format!("{{{{{var}}}}}"), value);
            }
        }
        result
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next(); // skip second '{'
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '}' {
                    chars.next();
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        break;
                    }
                } else {
                    var_name.push(ch);
                    chars.next();
                }
            }
            if !var_name.is_empty() && !variables.contains(&var_name) {
                variables.push(var_name);
            }
        }
    }

    variables
}

/// System instructions used by the answer composer
pub struct AssistantPrompts;

impl AssistantPrompts {
    /// Instruction when a knowledge-base fact was selected
    #[must_use]
    pub fn with_fact() -> PromptTemplate {
        PromptTemplate::new(
            r"Você é a Celine, a assistente virtual de RH da Fundação Tiradentes.

Responda à pergunta do colaborador usando exclusivamente a informação da base de conhecimento abaixo. Seja cordial e objetiva, em português do Brasil.

Tópico: {{topico}}
Informação: {{informacao}}

Se a informação acima não for suficiente para responder, diga exatamente que não encontrei essa informação e sugira procurar o RH.",
        )
    }

    /// Instruction when no fact matched but the conversation continues
    #[must_use]
    pub fn without_fact() -> PromptTemplate {
        PromptTemplate::new(
            r"Você é a Celine, a assistente virtual de RH da Fundação Tiradentes.

Nenhuma informação da base de conhecimento corresponde à pergunta atual. Se o histórico da conversa permitir responder, responda com base nele; caso contrário, diga exatamente que não encontrei essa informação e sugira procurar o RH. Seja cordial e objetiva, em português do Brasil.",
        )
    }

    /// Render the fact instruction for a selected fact
    #[must_use]
    pub fn render_with_fact(topic: &str, information: &str) -> String {
        let mut values = HashMap::new();
        values.insert("topico".to_string(), topic.to_string());
        values.insert("informacao".to_string(), information.to_string());
        Self::with_fact().render(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_variables() {
        let template = PromptTemplate::new("Hello {{name}}, you are {{age}} years old.");
        assert_eq!(template.variables(), &["name", "age"]);
    }

    #[test]
    fn test_template_render() {
        let template = PromptTemplate::new("Hello {{name}}!");
        let mut values = HashMap::new();
        values.insert("name".to_string(), "Alice".to_string());
        assert_eq!(template.render(&values), "Hello Alice!");
    }

    #[test]
    fn test_fact_instruction_fills_both_slots() {
        let rendered = AssistantPrompts::render_with_fact("Benefícios", "R$35/dia");
        assert!(rendered.contains("Tópico: Benefícios"));
        assert!(rendered.contains("Informação: R$35/dia"));
        assert!(!rendered.contains("{{"));
    }
}
