use crate::domain::checklist::StepPriority::{self, P0, P1, P2};
use crate::domain::checklist::{SectionDefinition, StepDefinition};

const fn step(id: &'static str, text: &'static str, priority: StepPriority) -> StepDefinition {
    StepDefinition { id, text, priority }
}

const FRONTEND_UI_STEPS: &[StepDefinition] = &[
    step("ui-01", "Set up test environment (browser, device lab)", P0),
    step("ui-02", "Review UI mockups and acceptance criteria", P0),
    step("ui-03", "Test all form validations (input, select, checkbox, radio)", P0),
    step("ui-04", "Test responsive design (mobile, tablet, desktop)", P1),
    step("ui-05", "Test keyboard navigation and tab order", P1),
    step("ui-06", "Test color contrast (WCAG AA 4.5:1)", P1),
    step("ui-07", "Test error states and empty states", P0),
    step("ui-08", "Test loading states and skeleton screens", P1),
    step("ui-09", "Test cross-browser compatibility (Chrome, Firefox, Safari, Edge)", P1),
    step("ui-10", "Test internationalization (if applicable)", P2),
    step("ui-11", "Take screenshots of all states", P2),
    step("ui-12", "Log UI defects with screenshots", P0),
];

const BACKEND_API_STEPS: &[StepDefinition] = &[
    step("api-01", "Review API documentation / Swagger", P0),
    step("api-02", "Set up SoapUI / Postman collection", P0),
    step("api-03", "Test all GET endpoints (200 OK, response schema)", P0),
    step("api-04", "Test all POST endpoints (201 Created, validation)", P0),
    step("api-05", "Test all PUT/PATCH endpoints (200 OK, partial update)", P0),
    step("api-06", "Test all DELETE endpoints (204 No Content, cascade)", P0),
    step("api-07", "Test authentication (valid token, expired token, no token)", P0),
    step("api-08", "Test authorization (role-based access)", P0),
    step("api-09", "Test input validation (required fields, types, ranges)", P0),
    step("api-10", "Test error responses (400, 401, 403, 404, 500)", P0),
    step("api-11", "Test pagination (offset, limit, total count)", P1),
    step("api-12", "Test filtering and sorting", P1),
    step("api-13", "Test rate limiting (429 Too Many Requests)", P1),
    step("api-14", "Test CORS headers", P1),
    step("api-15", "Document all test results", P0),
];

const LOAD_TESTING_STEPS: &[StepDefinition] = &[
    step("load-01", "Identify critical endpoints to test", P0),
    step("load-02", "Define load test scenarios (normal, peak, stress)", P0),
    step("load-03", "Set up load testing tool (k6, JMeter, Locust)", P0),
    step("load-04", "Configure virtual users and ramp-up", P1),
    step("load-05", "Run baseline test (10 users)", P0),
    step("load-06", "Run load test (100 users)", P0),
    step("load-07", "Run stress test (500+ users)", P1),
    step("load-08", "Analyze results and document findings", P0),
];

const PERFORMANCE_STEPS: &[StepDefinition] = &[
    step("perf-01", "Measure page load time (FCP, LCP, TTI)", P0),
    step("perf-02", "Test API response times under normal load", P0),
    step("perf-03", "Test database query performance", P0),
    step("perf-04", "Check memory usage and leaks", P1),
    step("perf-05", "Test with large datasets (1000+ records)", P1),
    step("perf-06", "Verify caching (HTTP cache, DB query cache)", P1),
    step("perf-07", "Check bundle size and asset optimization", P2),
    step("perf-08", "Test under slow network (3G simulation)", P1),
    step("perf-09", "Profile CPU usage during peak operations", P2),
    step("perf-10", "Generate performance report", P0),
];

const SECURITY_STEPS: &[StepDefinition] = &[
    step("sec-01", "Test SQL injection on all input fields", P0),
    step("sec-02", "Test XSS on all text inputs", P0),
    step("sec-03", "Test CSRF protection", P0),
    step("sec-04", "Verify authentication bypass attempts fail", P0),
    step("sec-05", "Test authorization - access other user's data", P0),
    step("sec-06", "Check PII masking in API responses", P0),
    step("sec-07", "Verify passwords are hashed (not plain text)", P0),
    step("sec-08", "Test session management (expiry, invalidation)", P1),
    step("sec-09", "Check security headers (CSP, HSTS, X-Frame-Options)", P1),
    step("sec-10", "Run vulnerability scan (OWASP ZAP)", P0),
];

const DATABASE_STEPS: &[StepDefinition] = &[
    step("db-01", "Verify schema matches documentation", P0),
    step("db-02", "Test all CRUD operations", P0),
    step("db-03", "Verify foreign key constraints", P0),
    step("db-04", "Test null handling and defaults", P1),
    step("db-05", "Verify indexes exist on query columns", P1),
    step("db-06", "Test concurrent access (WAL mode)", P1),
    step("db-07", "Test data integrity after transactions", P0),
    step("db-08", "Verify migration scripts run cleanly", P0),
];

const ACCESSIBILITY_STEPS: &[StepDefinition] = &[
    step("a11y-01", "Run automated a11y scan (axe, Lighthouse)", P0),
    step("a11y-02", "Test keyboard-only navigation", P0),
    step("a11y-03", "Test with screen reader (NVDA/VoiceOver)", P0),
    step("a11y-04", "Verify all images have alt text", P0),
    step("a11y-05", "Check color contrast ratios (4.5:1 minimum)", P0),
    step("a11y-06", "Test focus indicators visible", P1),
    step("a11y-07", "Verify form labels and ARIA attributes", P1),
    step("a11y-08", "Test skip navigation link", P2),
    step("a11y-09", "Verify heading hierarchy (h1 > h2 > h3)", P1),
    step("a11y-10", "Test error announcements for screen readers", P1),
];

const INTEGRATION_STEPS: &[StepDefinition] = &[
    step("int-01", "Test end-to-end registration flow", P0),
    step("int-02", "Test login -> dashboard -> transaction flow", P0),
    step("int-03", "Test fund transfer complete cycle", P0),
    step("int-04", "Test bill payment complete cycle", P0),
    step("int-05", "Test loan application complete cycle", P1),
    step("int-06", "Test SoapUI JDBC integration with database", P1),
    step("int-07", "Test API -> Database consistency", P0),
    step("int-08", "Test notification delivery after transactions", P1),
];

/// Compiled-in checklist. Step ids are stable; append new steps with fresh ids
/// rather than renumbering.
pub static SECTIONS: &[SectionDefinition] = &[
    SectionDefinition {
        id: "frontend-ui",
        title: "Frontend UI Testing",
        steps: FRONTEND_UI_STEPS,
    },
    SectionDefinition {
        id: "backend-api",
        title: "Backend API Testing",
        steps: BACKEND_API_STEPS,
    },
    SectionDefinition {
        id: "load-testing",
        title: "Load Testing",
        steps: LOAD_TESTING_STEPS,
    },
    SectionDefinition {
        id: "performance",
        title: "Performance Testing",
        steps: PERFORMANCE_STEPS,
    },
    SectionDefinition {
        id: "security",
        title: "Security Testing",
        steps: SECURITY_STEPS,
    },
    SectionDefinition {
        id: "database",
        title: "Database Testing",
        steps: DATABASE_STEPS,
    },
    SectionDefinition {
        id: "accessibility",
        title: "Web Accessibility Testing",
        steps: ACCESSIBILITY_STEPS,
    },
    SectionDefinition {
        id: "integration",
        title: "Integration Testing",
        steps: INTEGRATION_STEPS,
    },
];

pub fn find_section(section_id: &str) -> Option<&'static SectionDefinition> {
    SECTIONS.iter().find(|section| section.id == section_id)
}
