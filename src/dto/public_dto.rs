use uuid::Uuid;
use validator::Validate;

/// Text fields of the public application form, collected from multipart.
#[derive(Debug, Clone, Default, Validate)]
pub struct ApplicationForm {
    #[validate(length(min = 2, max = 200))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    #[validate(length(max = 200))]
    pub desired_role: Option<String>,
    pub message: Option<String>,
    pub job_id: Option<Uuid>,
}

impl ApplicationForm {
    /// Assigns one multipart text field. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) -> Result<(), String> {
        let value = value.trim().to_string();
        let optional = if value.is_empty() { None } else { Some(value.clone()) };
        match name {
            "full_name" => self.full_name = value,
            "email" => self.email = value,
            "phone" => self.phone = optional,
            "tax_id" => self.tax_id = optional,
            "desired_role" => self.desired_role = optional,
            "message" => self.message = optional,
            "job_id" => {
                self.job_id = match optional {
                    Some(raw) => Some(
                        raw.parse::<Uuid>()
                            .map_err(|_| format!("invalid job_id: {}", raw))?,
                    ),
                    None => None,
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_trimmed_and_blank_optionals_dropped() {
        let mut form = ApplicationForm::default();
        form.set_field("full_name", "  Ana Souza ".into()).unwrap();
        form.set_field("phone", "   ".into()).unwrap();
        form.set_field("unknown", "x".into()).unwrap();
        assert_eq!(form.full_name, "Ana Souza");
        assert!(form.phone.is_none());
        assert!(form.set_field("job_id", "not-a-uuid".into()).is_err());
    }
}
