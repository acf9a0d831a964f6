//! Prompt template for dashboard generation.

use crate::preview::DatasetPreview;
use crate::types::Prompt;
use crate::Error;

const USER_REQUIREMENTS: &str = "user_requirements";
const DATASET_PATH: &str = "dataset_path";
const DATASET_PREVIEW: &str = "dataset_preview";

/// System message sent ahead of the rendered instructions.
pub const SYSTEM_ROLE: &str = "You are an expert Python developer who writes complete, runnable \
data visualization scripts with Plotly and Dash. You answer with code only.";

/// Default instruction template. Placeholders: `{user_requirements}`, `{dataset_path}`,
/// `{dataset_preview}`.
pub const DEFAULT_TEMPLATE: &str = r#"Write a single, complete Python script that builds an interactive Dash dashboard for the dataset described below.

Dataset path: {dataset_path}

Dataset preview:
{dataset_preview}
The script must follow this structure:
1. Start with exactly these imports:
   import dash
   from dash import dcc, html, Input, Output, dash_table
   import pandas as pd
   import plotly.express as px
   import plotly.graph_objects as go
   import numpy as np
   import os
2. Right after the imports, load the data with this exact line:
   df = pd.read_csv(r'{dataset_path}')
3. Clean and preprocess df as the columns and the requirements demand: drop or fill missing values, convert dates with pd.to_datetime(..., errors='coerce') and numbers with pd.to_numeric(..., errors='coerce').
4. Create the app with:
   app = dash.Dash(__name__)
   server = app.server
5. Define app.layout with html components, filters (dcc.Dropdown, dcc.Slider, ...) whose options come from df, and dcc.Graph components with unique ids.
6. Add @app.callback functions that filter df from the filter inputs and return Plotly figures built from the filtered data. When a filter leaves no rows, return go.Figure() with an annotation saying so.
7. End with:
   if __name__ == '__main__':
       app.run(debug=True)

User requirements:
{user_requirements}

Output rules:
- Reply with the Python code only. No explanations, no apologies, no markdown fences.
- The code must be syntactically valid and runnable as a .py file as-is.
- Keep the pd.read_csv line pointing at the exact dataset path given above.
"#;

/// An instruction template with named `{placeholder}` slots.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Use a custom template. It must contain `{user_requirements}` and `{dataset_path}`.
    pub fn new(text: impl Into<String>) -> Result<Self, Error> {
        let text = text.into();
        for required in [USER_REQUIREMENTS, DATASET_PATH] {
            if !text.contains(&format!("{{{required}}}")) {
                return Err(Error::config(format!(
                    "prompt template is missing the {{{required}}} placeholder"
                )));
            }
        }
        Ok(Self { text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Fill the template. Substituted values are never re-scanned for placeholders.
    pub fn render(
        &self,
        dataset_path: &str,
        user_requirements: &str,
        preview: &DatasetPreview,
    ) -> Result<String, Error> {
        let safe_path = dataset_path.replace('\\', "\\\\");
        let preview_text = preview.render()?;

        let mut out = String::with_capacity(self.text.len() + preview_text.len() + 256);
        let mut rest = self.text.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let name = after.find('}').map(|close| &after[..close]);

            let value = match name {
                Some(USER_REQUIREMENTS) => Some(user_requirements),
                Some(DATASET_PATH) => Some(safe_path.as_str()),
                Some(DATASET_PREVIEW) => Some(preview_text.as_str()),
                _ => None,
            };

            match (name, value) {
                (Some(name), Some(value)) => {
                    out.push_str(value);
                    rest = &after[name.len() + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);

        Ok(out)
    }
}

/// Assemble the full conversation for one generation.
pub fn build_prompt(
    template: &PromptTemplate,
    dataset_path: &str,
    user_requirements: &str,
    preview: &DatasetPreview,
) -> Result<Prompt, Error> {
    let instructions = template.render(dataset_path, user_requirements, preview)?;
    Ok(Prompt::system(SYSTEM_ROLE).with_user(instructions))
}
