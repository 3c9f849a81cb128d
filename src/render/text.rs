use tabled::{builder::Builder, settings::Style};

use super::{RenderError, Renderer};
use crate::types::{Artifact, PresentedTable};

/// Plain-text table. Produces no file.
pub struct TextRenderer;

impl TextRenderer {
    pub fn render_string(&self, table: &PresentedTable) -> String {
        if table.is_empty() {
            return format!("{}\nNo namespaces found", table.title);
        }

        let mut builder = Builder::default();
        let mut header = vec!["Namespace".to_string()];
        header.extend(table.fields.iter().map(|f| f.header().to_string()));
        builder.push_record(header);

        for row in &table.rows {
            let mut record = vec![row.namespace.clone()];
            record.extend(
                table
                    .fields
                    .iter()
                    .map(|f| row.cell(*f).unwrap_or("-").to_string()),
            );
            builder.push_record(record);
        }

        let mut rendered = builder.build();
        rendered.with(Style::rounded());
        format!("{}\n{}", table.title, rendered)
    }
}

impl Renderer for TextRenderer {
    fn render(&self, table: &PresentedTable) -> Result<Artifact, RenderError> {
        Ok(Artifact::Text(self.render_string(table)))
    }
}
