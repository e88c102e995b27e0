pub mod jobmodel;
pub mod notificationmodel;
pub mod supportmodel;
pub mod usermodel;
