//! Line-oriented front-end for [`ChatWidget`].

use crate::chat_api::ChatApi;
use crate::widget::{ChatWidget, render_transcript};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

const EXIT_COMMAND: &str = "/salir";
const CONTACT_COMMAND: &str = "/contacto";

pub struct Console<A, R, W> {
    widget: ChatWidget<A>,
    lines: Lines<R>,
    out: W,
    rendered: usize,
}

impl<A, R, W> Console<A, R, W>
where
    A: ChatApi,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(widget: ChatWidget<A>, input: R, out: W) -> Self {
        Self {
            widget,
            lines: input.lines(),
            out,
            rendered: 0,
        }
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (ChatWidget<A>, W) {
        (self.widget, self.out)
    }

    pub async fn run(&mut self) -> std::io::Result<()> {
        self.write(&format!(
            "Escribe tu pregunta ({EXIT_COMMAND} para terminar).\n"
        ))
        .await?;
        loop {
            self.write("> ").await?;
            let Some(line) = self.lines.next_line().await? else {
                break;
            };
            match line.trim() {
                EXIT_COMMAND => break,
                CONTACT_COMMAND if self.widget.state().contact.visible => {
                    if !self.fill_contact_form().await? {
                        break;
                    }
                }
                _ => {
                    let was_visible = self.widget.state().contact.visible;
                    self.widget.state_mut().input = line;
                    self.widget.send_message().await;
                    self.flush_transcript().await?;
                    // only the answer that reveals the form opens it; later
                    // answers leave a pending form to /contacto
                    let revealed = !was_visible && self.widget.state().contact.visible;
                    if revealed && !self.fill_contact_form().await? {
                        break;
                    }
                }
            }
        }
        self.out.flush().await
    }

    /// Prompts for the three form fields and submits them. Fields already
    /// filled in are offered as defaults. Returns false on end of input.
    async fn fill_contact_form(&mut self) -> std::io::Result<bool> {
        self.write("Déjanos tus datos de contacto (nombre vacío para omitir).\n")
            .await?;
        let current = self.widget.state().contact.clone();
        let Some(name) = self.prompt("Nombre", &current.name).await? else {
            return Ok(false);
        };
        if name.trim().is_empty() {
            self.write(&format!(
                "Formulario pendiente; escribe {CONTACT_COMMAND} para completarlo.\n"
            ))
            .await?;
            return Ok(true);
        }
        let Some(email) = self.prompt("Correo electrónico", &current.email).await? else {
            return Ok(false);
        };
        let Some(organization) = self.prompt("Organización", &current.organization).await? else {
            return Ok(false);
        };
        let form = &mut self.widget.state_mut().contact;
        form.name = name;
        form.email = email;
        form.organization = organization;

        self.widget.send_contact().await;
        self.flush_transcript().await?;
        if self.widget.state().contact.visible {
            self.write(&format!(
                "Tus datos se conservan; escribe {CONTACT_COMMAND} para reintentar.\n"
            ))
            .await?;
        }
        Ok(true)
    }

    /// Reads one field; a blank entry keeps `current`.
    async fn prompt(&mut self, label: &str, current: &str) -> std::io::Result<Option<String>> {
        if current.is_empty() {
            self.write(&format!("{label}: ")).await?;
        } else {
            self.write(&format!("{label} [{current}]: ")).await?;
        }
        let Some(entry) = self.lines.next_line().await? else {
            return Ok(None);
        };
        if entry.trim().is_empty() {
            Ok(Some(current.to_string()))
        } else {
            Ok(Some(entry))
        }
    }

    async fn flush_transcript(&mut self) -> std::io::Result<()> {
        let lines = render_transcript(self.widget.state());
        let start = self.rendered.min(lines.len());
        self.rendered = lines.len();
        for line in &lines[start..] {
            self.write(line).await?;
            self.write("\n").await?;
        }
        Ok(())
    }

    async fn write(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes()).await
    }
}
