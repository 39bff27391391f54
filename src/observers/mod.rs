pub mod form_submit_observer;
pub mod interception;
pub mod link_click_observer;
