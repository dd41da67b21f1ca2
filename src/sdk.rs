/// DOM ids the widget script binds to, in the order `mount` destructures them.
pub const ELEMENT_IDS: [&str; 8] = [
    "user-input",
    "send-button",
    "chat-messages",
    "contact-form",
    "contact-name",
    "contact-email",
    "contact-organization",
    "submit-contact",
];

pub fn widget_script() -> String {
    r#"// Lead chat widget: transcript + contact form wired to /ask and /contact
(function(global) {
  const GREETING_MARKER = "¡hola! soy un asistente experto";
  const CONNECTION_ERROR = "Error al conectar con el servidor.";
  const ELEMENT_IDS = __ELEMENT_IDS__;
  const CONTACT_THANKS = "Gracias por proporcionar tus datos de contacto. Nos pondremos en contacto contigo pronto.";

  function isGreetingAnswer(answer) {
    return String(answer || "").toLowerCase().includes(GREETING_MARKER);
  }

  function mount() {
    const [input, send, messages, form, name, email, organization, submit] =
      ELEMENT_IDS.map((id) => document.getElementById(id));
    const el = { input, send, messages, form, name, email, organization, submit };
    if (Object.values(el).some((node) => !node)) {
      console.warn("LeadChat: widget elements missing; not mounting");
      return null;
    }

    function addMessage(text, isUser = false) {
      const div = document.createElement("div");
      div.className = `message ${isUser ? "user-message" : "bot-message"}`;
      const label = document.createElement("strong");
      label.textContent = isUser ? "Tú:" : "Bot:";
      div.appendChild(label);
      div.appendChild(document.createTextNode(" " + text));
      el.messages.appendChild(div);
      el.messages.scrollTop = el.messages.scrollHeight;
    }

    function showContactForm() {
      el.form.style.display = "block";
      el.name.focus();
    }

    function hideContactForm() {
      el.form.style.display = "none";
      el.name.value = "";
      el.email.value = "";
      el.organization.value = "";
    }

    async function postJson(path, body) {
      const res = await fetch(path, {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(body),
      });
      return res.json();
    }

    async function sendMessage() {
      const question = el.input.value.trim();
      if (!question) return;
      addMessage(question, true);
      el.input.value = "";
      try {
        const data = await postJson("/ask", { question });
        if (data.error) {
          addMessage(`Error: ${data.error}`);
        } else {
          addMessage(data.answer);
          if (data.requires_contact && !isGreetingAnswer(data.answer)) {
            showContactForm();
          }
        }
      } catch (err) {
        addMessage(CONNECTION_ERROR);
        console.error("LeadChat:", err);
      }
    }

    async function sendContact() {
      const name = el.name.value.trim();
      const email = el.email.value.trim();
      const organization = el.organization.value.trim();
      if (!name || !email || !organization) return;
      try {
        const data = await postJson("/contact", { name, email, organization });
        if (data.success) {
          addMessage(CONTACT_THANKS);
          hideContactForm();
        } else {
          addMessage(`Error: ${data.error || "error desconocido"}`);
        }
      } catch (err) {
        addMessage(CONNECTION_ERROR);
        console.error("LeadChat:", err);
      }
    }

    el.send.addEventListener("click", sendMessage);
    el.input.addEventListener("keypress", (e) => {
      if (e.key === "Enter") sendMessage();
    });
    el.submit.addEventListener("click", sendContact);
    el.email.addEventListener("keypress", (e) => {
      if (e.key === "Enter") sendContact();
    });
    return { sendMessage, sendContact, showContactForm, hideContactForm };
  }

  global.LeadChat = { mount, isGreetingAnswer };
  document.addEventListener("DOMContentLoaded", mount);
})(window);
"#
    .replace("__ELEMENT_IDS__", &serde_json::json!(ELEMENT_IDS).to_string())
}
