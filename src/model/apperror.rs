use std::fmt;

/**
 * Identifies which lookup failed when a referenced entity could not be resolved.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Vehicle,
    Postcode,
    City,
    Region,
    DistanceBracket,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Lookup::Vehicle => "vehicle",
            Lookup::Postcode => "postcode",
            Lookup::City => "city",
            Lookup::Region => "region",
            Lookup::DistanceBracket => "distance bracket",
        };
        write!(f, "{name}")
    }
}

/**
 * Represents the type of error that can occur within the application.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    Initialization,
    Validation,
    NotFound(Lookup),
    ConstraintViolation,
    DatabaseError,
}

/**
 * Represents an error that occurs within the application.
 */
#[derive(Debug, Clone)]
pub struct ApplicationError {
    /**
     * Error type.
     */
    pub error_type: ErrorType,
    /**
     * Error message describing problem.
     */
    pub message: String,
}

impl ApplicationError {
    /**
     * Creates a new ApplicationError.
     *
     * #Arguments
     * `error_type`: The type of error.
     * `message`: A description of the error.
     */
    pub fn new(error_type: ErrorType, message: String) -> Self {
        ApplicationError { error_type, message }
    }

    /**
     * Creates a not found error naming the failed lookup and the key that did not resolve.
     *
     * #Arguments
     * `lookup`: The entity that could not be resolved.
     * `key`: The key used for the lookup.
     */
    pub fn not_found(lookup: Lookup, key: impl fmt::Display) -> Self {
        ApplicationError::new(ErrorType::NotFound(lookup), format!("No {lookup} found for '{key}'"))
    }

    /**
     * Returns the failed lookup if this is a not found error.
     */
    pub fn lookup(&self) -> Option<Lookup> {
        match self.error_type {
            ErrorType::NotFound(lookup) => Some(lookup),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApplicationError {}
