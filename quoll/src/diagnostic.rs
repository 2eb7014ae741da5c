use codespan_reporting::diagnostic::LabelStyle;

use crate::typechecker::TypeCheckDiagnostic;

pub type Diagnostic = codespan_reporting::diagnostic::Diagnostic<usize>;

pub trait ErrorDiagnostic {
    fn diagnostic(self) -> Diagnostic;
}

impl ErrorDiagnostic for TypeCheckDiagnostic {
    fn diagnostic(self) -> Diagnostic {
        let span = self.span();
        let mut labels = vec![span
            .diagnostic_label(LabelStyle::Primary)
            .with_message(self.to_string())];

        if let TypeCheckDiagnostic::UnknownUnit {
            suggestion: Some(suggestion),
            ..
        } = &self
        {
            labels.push(
                span.diagnostic_label(LabelStyle::Secondary)
                    .with_message(format!("Did you mean '{suggestion}'?")),
            );
        }

        Diagnostic::error()
            .with_message("while checking units")
            .with_labels(labels)
    }
}
