//! Rule evaluator -- pure logic, no form state mutation.

use crate::wizard::FormStep;

use super::rules::{rules_for, FieldErrors, FormField, RuleInput};

/// Result of evaluating one step's rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// First failing message per field.
    pub errors: FieldErrors,
    /// Every field the step owns, failing or not.
    pub checked: Vec<FormField>,
}

impl StepOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Evaluate every rule of `step` against `input`.
///
/// Rules run in table order; once a field has failed, later rules for the
/// same field are skipped so the user sees one message per field.
pub fn evaluate_step(step: FormStep, input: &RuleInput<'_>) -> StepOutcome {
    let mut outcome = StepOutcome::default();

    for rule in rules_for(step) {
        if !outcome.checked.contains(&rule.field) {
            outcome.checked.push(rule.field);
        }
        if outcome.errors.contains_key(&rule.field) {
            continue;
        }
        if let Some(message) = (rule.check)(input) {
            outcome.errors.insert(rule.field, message);
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::listing::{FormFieldSet, Gender};

    fn valid_fields() -> FormFieldSet {
        FormFieldSet {
            name: "Premium Boer Goat Buck".into(),
            category_id: Some(Uuid::new_v4()),
            breed: "Boer".into(),
            gender: Gender::Male,
            age: "2 years".into(),
            weight: "45kg".into(),
            price: "250000".into(),
            location: "Ibadan, Oyo".into(),
            description: "A healthy, well-fed buck raised on open pasture with regular vet checks."
                .into(),
            health_status: "Excellent, dewormed last month".into(),
            ..Default::default()
        }
    }

    fn input(fields: &FormFieldSet, attachments: usize) -> RuleInput<'_> {
        RuleInput {
            fields,
            attachment_count: attachments,
        }
    }

    #[test]
    fn valid_fields_pass_every_step() {
        let fields = valid_fields();
        for step in FormStep::ALL {
            let outcome = evaluate_step(step, &input(&fields, 1));
            assert!(outcome.is_valid(), "{step} failed: {:?}", outcome.errors);
        }
    }

    #[test]
    fn short_name_fails_basic_info() {
        let mut fields = valid_fields();
        fields.name = "ab".into();
        let outcome = evaluate_step(FormStep::BasicInfo, &input(&fields, 0));
        assert!(!outcome.is_valid());
        assert_eq!(
            outcome.errors.get(&FormField::Name).map(String::as_str),
            Some("Name must be at least 3 characters")
        );
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn empty_form_reports_each_basic_field_once() {
        let fields = FormFieldSet::default();
        let outcome = evaluate_step(FormStep::BasicInfo, &input(&fields, 0));
        let failed: Vec<_> = outcome.errors.keys().copied().collect();
        assert_eq!(
            failed,
            vec![
                FormField::Name,
                FormField::CategoryId,
                FormField::Breed,
                FormField::Gender,
                FormField::Age,
            ]
        );
    }

    #[test]
    fn overlong_name_fails() {
        let mut fields = valid_fields();
        fields.name = "x".repeat(201);
        let outcome = evaluate_step(FormStep::BasicInfo, &input(&fields, 0));
        assert!(outcome.errors[&FormField::Name].contains("at most 200"));
    }

    #[test]
    fn price_must_be_positive_number() {
        let mut fields = valid_fields();
        for bad in ["", "0", "-5", "ten"] {
            fields.price = bad.into();
            let outcome = evaluate_step(FormStep::PricingLocation, &input(&fields, 0));
            assert!(outcome.errors.contains_key(&FormField::Price), "{bad:?} accepted");
        }
        fields.price = "0.01".into();
        assert!(evaluate_step(FormStep::PricingLocation, &input(&fields, 0)).is_valid());
    }

    #[test]
    fn currency_must_be_three_letters() {
        let mut fields = valid_fields();
        fields.currency = "NG".into();
        let outcome = evaluate_step(FormStep::PricingLocation, &input(&fields, 0));
        assert!(outcome.errors.contains_key(&FormField::Currency));
    }

    #[test]
    fn details_thresholds() {
        let mut fields = valid_fields();
        fields.description = "x".repeat(49);
        fields.health_status = "x".repeat(19);
        let outcome = evaluate_step(FormStep::DetailsHealth, &input(&fields, 0));
        assert!(outcome.errors.contains_key(&FormField::Description));
        assert!(outcome.errors.contains_key(&FormField::HealthStatus));

        fields.description = "x".repeat(50);
        fields.health_status = "x".repeat(20);
        assert!(evaluate_step(FormStep::DetailsHealth, &input(&fields, 0)).is_valid());
    }

    #[test]
    fn media_step_requires_an_attachment() {
        let fields = valid_fields();
        assert!(!evaluate_step(FormStep::Media, &input(&fields, 0)).is_valid());
        assert!(evaluate_step(FormStep::Media, &input(&fields, 1)).is_valid());
    }

    #[test]
    fn checked_lists_owned_fields_without_duplicates() {
        let fields = valid_fields();
        let outcome = evaluate_step(FormStep::PricingLocation, &input(&fields, 0));
        assert_eq!(
            outcome.checked,
            vec![FormField::Price, FormField::Currency, FormField::Location]
        );
    }
}
