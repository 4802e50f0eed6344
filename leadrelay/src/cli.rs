//! The `submit` subcommand: the landing page form, driven from a terminal.

use crate::config::{BusinessContact, SubmitArgs};
use crate::form::{FormController, FormState, HttpLeadTransport, LeadForm, SubmitOutcome};

pub const SENT_MESSAGE: &str = "Заявка отправлена. Мы перезвоним.";

/// Submit one lead to the relay at `args.endpoint`.
///
/// A lead that is not accepted becomes an error carrying the form's message and the number to
/// call instead.
pub async fn submit(args: SubmitArgs, contact: BusinessContact) -> anyhow::Result<&'static str> {
    let mut form = LeadForm {
        name: args.name,
        phone: args.phone,
        car: args.car,
        problem: args.problem,
        preferred_time: args.preferred_time,
        company: String::new(),
    };

    let phone_pretty = contact.phone_pretty.clone();
    let mut controller = FormController::new(HttpLeadTransport::new(args.endpoint), args.page_url, contact);

    let state = controller.submit(&mut form).await?.clone();
    match state {
        FormState::Resolved(SubmitOutcome::Sent) => Ok(SENT_MESSAGE),
        FormState::Resolved(SubmitOutcome::Failed { message }) => {
            anyhow::bail!("{message} {phone_pretty} ({})", controller.call_href())
        }
        state => anyhow::bail!("submission did not resolve: {state:?}"),
    }
}
