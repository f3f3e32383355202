//! Input size limits shared by the service layer and the HTTP forms.

/// Maximum email address size (bytes).
pub const MAX_EMAIL_SIZE: usize = 254;

/// Maximum username size (bytes).
pub const MAX_USERNAME_SIZE: usize = 64;

/// Maximum password size (bytes). Bounds the hashing cost per request.
pub const MAX_PASSWORD_SIZE: usize = 1024;

/// Maximum thread title size (512 bytes).
pub const MAX_THREAD_TITLE_SIZE: usize = 512;

/// Maximum thread body size (100KB).
pub const MAX_THREAD_CONTENT_SIZE: usize = 100 * 1024;

/// Maximum comment size (10KB).
pub const MAX_COMMENT_SIZE: usize = 10 * 1024;
