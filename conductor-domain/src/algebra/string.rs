pub trait StringExt {
    fn snake_case(&self) -> String;
    /// True for plain, unquoted SQL identifiers such as `outboxevent` or `aggregate_id`.
    fn is_sql_identifier(&self) -> bool;
}

impl StringExt for str {
    fn snake_case(&self) -> String {
        let mut snake_case = String::with_capacity(self.len());

        for (i, c) in self.chars().enumerate() {
            if c.is_ascii_uppercase() && i > 0 {
                snake_case.push('_');
                snake_case.push(c.to_ascii_lowercase());
            } else if c == ' ' || c == '-' {
                snake_case.push('_');
            } else {
                snake_case.push(c.to_ascii_lowercase());
            }
        }

        snake_case
    }

    fn is_sql_identifier(&self) -> bool {
        let mut chars = self.chars();

        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                self.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }
}

impl StringExt for String {
    fn snake_case(&self) -> String {
        self.as_str().snake_case()
    }

    fn is_sql_identifier(&self) -> bool {
        self.as_str().is_sql_identifier()
    }
}
