//! The registration page and the endpoint that creates user accounts.

use axum::{Form, extract::State};
use maud::{Markup, html};

use crate::{
    Error,
    auth::{
        password::PasswordHash,
        user::{NewUser, Registration},
    },
    endpoints,
    form::{FormData, FormSchema},
    html::{BUTTON_PRIMARY_STYLE, LINK_STYLE, base, labelled_input, log_in_register},
    mutation::{self, MutationOutcome, MutationState, Target},
};

/// New users are sent to the log-in page. No cached view shows users.
pub const USERS: Target = Target {
    entity: "User",
    view_paths: &[],
    redirect_path: endpoints::LOG_IN_VIEW,
};

fn registration_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6"
        {
            (labelled_input("Email", "email", "email", "", true))
            (labelled_input("Username", "username", "text", "", true))
            (labelled_input("Password", "password", "password", "", true))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Markup {
    let registration_form = registration_form();
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &content)
}

/// Create a user from the registration form and send the client to the log-in page.
///
/// # Errors
///
/// Returns a validation error if a field is missing or malformed, or a hashing error if the
/// password could not be hashed. A failed insert, such as a duplicate email, is reported as
/// [MutationOutcome::Failed].
pub async fn register_user(
    State(state): State<MutationState>,
    Form(form): Form<FormData>,
) -> Result<MutationOutcome, Error> {
    let registration = Registration::parse(&form)?;
    let password_hash = PasswordHash::new(&registration.password, PasswordHash::DEFAULT_COST)?;

    let user = NewUser {
        email: registration.email,
        name: registration.username,
        password_hash,
    };

    Ok(mutation::create(&user, &USERS, &state))
}
